//! In-process simulated venue.
//!
//! Behaves like a remote gateway from the client's point of view: every
//! outcome arrives later, on the caller's event loop, through the
//! [`EventSink`]. Requires a running tokio runtime.
//!
//! - Login accepts any non-empty username with the configured password (or
//!   any non-empty password when none is configured).
//! - A lookup reports one non-final miss, then a final hit or miss against
//!   the configured catalog.
//! - Time and sales is a seeded random walk, batched.
//! - The order feed downloads a starting book, then mutates it at random.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{
    Connector, EventSink, GatewayEvent, LookupUpdate, Session, Subscription, SubscriptionKind,
};
use crate::config::SimConfig;
use crate::domain::{
    AuthStatus, BuySell, Credentials, Instrument, InstrumentId, InstrumentKey, Order, OrderAction,
    OrderEvent, OrderStatus, SiteOrderKey, Tick,
};
use crate::error::{Error, Result};

const INIT_DELAY: Duration = Duration::from_millis(20);
const LOOKUP_DELAY: Duration = Duration::from_millis(50);

/// Connector for the simulated venue.
pub struct SimConnector {
    config: SimConfig,
}

impl SimConnector {
    #[must_use]
    pub const fn new(config: SimConfig) -> Self {
        Self { config }
    }
}

impl Connector for SimConnector {
    fn initialize(self: Box<Self>, sink: EventSink) {
        let config = self.config;
        tokio::spawn(async move {
            tokio::time::sleep(INIT_DELAY).await;
            info!(account = %config.account, "Simulated venue ready");
            let session = SimSession::new(config, sink.clone());
            sink.emit(GatewayEvent::Initialized(Ok(Box::new(session))));
        });
    }

    fn name(&self) -> &'static str {
        "sim"
    }
}

/// Session state shared with the feed tasks.
struct Shared {
    authenticated: AtomicBool,
    shut_down: AtomicBool,
    seed: AtomicU64,
}

impl Shared {
    fn live(&self) -> bool {
        !self.shut_down.load(Ordering::SeqCst)
    }

    /// A fresh RNG per feed, derived from the base seed.
    fn rng(&self) -> StdRng {
        let seed = self.seed.fetch_add(1, Ordering::SeqCst);
        StdRng::seed_from_u64(seed)
    }
}

pub struct SimSession {
    config: SimConfig,
    sink: EventSink,
    shared: Arc<Shared>,
}

impl SimSession {
    pub fn new(config: SimConfig, sink: EventSink) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self {
            config,
            sink,
            shared: Arc::new(Shared {
                authenticated: AtomicBool::new(false),
                shut_down: AtomicBool::new(false),
                seed: AtomicU64::new(seed),
            }),
        }
    }

    fn check_credentials(&self, credentials: &Credentials) -> AuthStatus {
        if credentials.username.trim().is_empty() {
            return AuthStatus::failed("Invalid username");
        }
        let password_ok = match &self.config.password {
            Some(expected) => &credentials.password == expected,
            None => !credentials.password.is_empty(),
        };
        if password_ok {
            AuthStatus::success()
        } else {
            AuthStatus::failed("Invalid username or password")
        }
    }

    fn require_login(&self) -> Result<()> {
        if !self.shared.live() {
            return Err(Error::Gateway("session is shut down".into()));
        }
        if !self.shared.authenticated.load(Ordering::SeqCst) {
            return Err(Error::Gateway("session is not authenticated".into()));
        }
        Ok(())
    }

    fn feed(&self, kind: SubscriptionKind, plan: FeedPlan) -> Box<dyn Subscription> {
        Box::new(SimSubscription {
            kind,
            plan: Some(plan),
            sink: self.sink.clone(),
            shared: Arc::clone(&self.shared),
            task: None,
        })
    }
}

impl Session for SimSession {
    fn authenticate(&mut self, credentials: &Credentials) {
        let status = self.check_credentials(credentials);
        self.shared
            .authenticated
            .store(status.success, Ordering::SeqCst);
        debug!(user = %credentials.username, success = status.success, "Simulated login");
        self.sink.emit(GatewayEvent::Authentication(status));
    }

    fn lookup_instrument(&mut self, key: &InstrumentKey) -> Result<Box<dyn Subscription>> {
        self.require_login()?;
        let listed = self.config.catalog.iter().any(|entry| entry.lists(key));
        Ok(self.feed(
            SubscriptionKind::InstrumentLookup,
            FeedPlan::Lookup {
                key: key.clone(),
                listed,
            },
        ))
    }

    fn subscribe_time_and_sales(
        &mut self,
        instrument: &Instrument,
    ) -> Result<Box<dyn Subscription>> {
        self.require_login()?;
        debug!(instrument = %instrument.name, "Simulated time and sales");
        Ok(self.feed(
            SubscriptionKind::TimeAndSales,
            FeedPlan::Ticks {
                walk: TickWalk::new(self.config.start_price, self.config.tick_size),
                interval: Duration::from_millis(self.config.tick_interval_ms),
            },
        ))
    }

    fn subscribe_orders(&mut self) -> Result<Box<dyn Subscription>> {
        self.require_login()?;
        Ok(self.feed(
            SubscriptionKind::Orders,
            FeedPlan::Orders {
                book: SimBook::new(
                    self.config.account.clone(),
                    self.config.start_price,
                    self.config.tick_size,
                ),
                initial: self.config.initial_orders,
                interval: Duration::from_millis(self.config.order_interval_ms),
            },
        ))
    }

    fn shutdown(&mut self) {
        if !self.shared.shut_down.swap(true, Ordering::SeqCst) {
            info!("Simulated session shut down");
        }
    }
}

/// What a simulated subscription does once started.
enum FeedPlan {
    Lookup {
        key: InstrumentKey,
        listed: bool,
    },
    Ticks {
        walk: TickWalk,
        interval: Duration,
    },
    Orders {
        book: SimBook,
        initial: usize,
        interval: Duration,
    },
}

struct SimSubscription {
    kind: SubscriptionKind,
    plan: Option<FeedPlan>,
    sink: EventSink,
    shared: Arc<Shared>,
    task: Option<JoinHandle<()>>,
}

impl Subscription for SimSubscription {
    fn start(&mut self) -> Result<()> {
        let plan = self
            .plan
            .take()
            .ok_or_else(|| Error::Gateway(format!("{} subscription already started", self.kind)))?;
        let sink = self.sink.clone();
        let shared = Arc::clone(&self.shared);
        let mut rng = shared.rng();

        let task = match plan {
            FeedPlan::Lookup { key, listed } => tokio::spawn(async move {
                sink.emit(GatewayEvent::InstrumentLookup(LookupUpdate::pending(
                    "searching",
                )));
                tokio::time::sleep(LOOKUP_DELAY).await;
                if !shared.live() {
                    return;
                }
                let update = if listed {
                    let id = InstrumentId::new(format!(
                        "{}-{}-{}-{}",
                        key.product.market, key.product.product_type, key.product.product, key.contract
                    ));
                    LookupUpdate::found(Instrument::new(id, key))
                } else {
                    LookupUpdate::not_found(format!("{key} is not listed"))
                };
                sink.emit(GatewayEvent::InstrumentLookup(update));
            }),
            FeedPlan::Ticks { mut walk, interval } => tokio::spawn(async move {
                let mut timer = tokio::time::interval(interval);
                timer.tick().await;
                while shared.live() {
                    timer.tick().await;
                    let batch = walk.next_batch(&mut rng);
                    if !sink.emit(GatewayEvent::TimeAndSales(Ok(batch))) {
                        break;
                    }
                }
            }),
            FeedPlan::Orders {
                mut book,
                initial,
                interval,
            } => tokio::spawn(async move {
                let download = book.seed(initial, &mut rng);
                if !sink.emit(GatewayEvent::Order(Ok(OrderEvent::BookDownload(download)))) {
                    return;
                }
                let mut timer = tokio::time::interval(interval);
                timer.tick().await;
                while shared.live() {
                    timer.tick().await;
                    let event = book.next_event(&mut rng);
                    if !sink.emit(GatewayEvent::Order(Ok(event))) {
                        break;
                    }
                }
            }),
        };
        self.task = Some(task);
        Ok(())
    }

    fn dispose(&mut self) {
        self.plan = None;
        if let Some(task) = self.task.take() {
            debug!(kind = %self.kind, "Stopping simulated feed");
            task.abort();
        }
    }

    fn kind(&self) -> SubscriptionKind {
        self.kind
    }
}

impl Drop for SimSubscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Random-walk trade tape.
#[derive(Debug, Clone)]
pub struct TickWalk {
    price: Decimal,
    tick_size: Decimal,
}

impl TickWalk {
    #[must_use]
    pub const fn new(start: Decimal, tick_size: Decimal) -> Self {
        Self {
            price: start,
            tick_size,
        }
    }

    /// One to three prints, each within one tick of the previous.
    pub fn next_batch<R: Rng>(&mut self, rng: &mut R) -> Vec<Tick> {
        let count = rng.gen_range(1..=3);
        (0..count)
            .map(|_| {
                let step: i64 = rng.gen_range(-1..=1);
                let next = self.price + self.tick_size * Decimal::from(step);
                if next > Decimal::ZERO {
                    self.price = next;
                }
                Tick::new(self.price, rng.gen_range(1..=25))
            })
            .collect()
    }
}

/// Working orders for the simulated account.
#[derive(Debug, Clone)]
pub struct SimBook {
    account: String,
    mid: Decimal,
    tick_size: Decimal,
    next_number: u64,
    orders: Vec<Order>,
}

impl SimBook {
    #[must_use]
    pub fn new(account: String, mid: Decimal, tick_size: Decimal) -> Self {
        Self {
            account,
            mid,
            tick_size,
            next_number: 1,
            orders: Vec::new(),
        }
    }

    /// Place `count` working orders and return them as the download batch.
    pub fn seed<R: Rng>(&mut self, count: usize, rng: &mut R) -> Vec<Order> {
        (0..count)
            .map(|_| {
                let order = self.new_order(rng);
                self.orders.push(order.clone());
                order
            })
            .collect()
    }

    #[must_use]
    pub fn working(&self) -> &[Order] {
        &self.orders
    }

    fn new_order<R: Rng>(&mut self, rng: &mut R) -> Order {
        let side = if rng.gen_bool(0.5) {
            BuySell::Buy
        } else {
            BuySell::Sell
        };
        let offset = self.tick_size * Decimal::from(rng.gen_range(1..=8_i64));
        let limit_price = match side {
            BuySell::Buy => self.mid - offset,
            BuySell::Sell => self.mid + offset,
        };
        let quantity = rng.gen_range(1..=10);
        let number = self.next_number;
        self.next_number += 1;
        Order {
            account: self.account.clone(),
            status: OrderStatus::Working,
            action: OrderAction::Add,
            side,
            order_quantity: quantity,
            working_quantity: quantity,
            limit_price,
            site_order_key: SiteOrderKey::new(uuid::Uuid::new_v4().to_string()),
            order_number: number.to_string(),
        }
    }

    /// Apply one random lifecycle change and describe it.
    pub fn next_event<R: Rng>(&mut self, rng: &mut R) -> OrderEvent {
        if self.orders.is_empty() || rng.gen_range(0..100) < 25 {
            let mut order = self.new_order(rng);
            if rng.gen_range(0..100) < 10 {
                order.status = OrderStatus::Rejected;
                order.working_quantity = 0;
                return OrderEvent::Rejected(order);
            }
            self.orders.push(order.clone());
            return OrderEvent::Added(order);
        }

        let index = rng.gen_range(0..self.orders.len());
        let roll = rng.gen_range(0..100);
        if roll < 40 {
            let order = &mut self.orders[index];
            let fill = rng.gen_range(1..=order.working_quantity.max(1));
            order.working_quantity -= fill.min(order.working_quantity);
            order.status = if order.working_quantity == 0 {
                OrderStatus::Filled
            } else {
                OrderStatus::PartiallyFilled
            };
            let snapshot = order.clone();
            if snapshot.working_quantity == 0 {
                self.orders.remove(index);
            }
            OrderEvent::Filled(snapshot)
        } else if roll < 70 {
            let tick_size = self.tick_size;
            let order = &mut self.orders[index];
            let step = if rng.gen_bool(0.5) { tick_size } else { -tick_size };
            if order.limit_price + step > Decimal::ZERO {
                order.limit_price += step;
            }
            order.action = OrderAction::Change;
            OrderEvent::Updated(order.clone())
        } else if roll < 95 {
            let mut order = self.orders.remove(index);
            order.action = OrderAction::Delete;
            order.status = OrderStatus::Cancelled;
            order.working_quantity = 0;
            OrderEvent::Deleted(order)
        } else {
            let mut order = self.orders[index].clone();
            order.status = OrderStatus::Unknown;
            OrderEvent::StatusUnknown(order)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;
    use crate::testkit::config::fast_sim;
    use crate::testkit::domain::es_key;
    use rust_decimal_macros::dec;

    #[test]
    fn tick_walk_stays_on_the_grid() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut walk = TickWalk::new(dec!(100.00), dec!(0.25));
        for _ in 0..50 {
            let batch = walk.next_batch(&mut rng);
            assert!((1..=3).contains(&batch.len()));
            for tick in batch {
                assert_eq!(tick.price % dec!(0.25), Decimal::ZERO);
                assert!((1..=25).contains(&tick.quantity));
            }
        }
    }

    #[test]
    fn book_seed_returns_every_order() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut book = SimBook::new("SIM1".into(), dec!(1475), dec!(0.25));
        let download = book.seed(4, &mut rng);

        assert_eq!(download.len(), 4);
        assert_eq!(book.working().len(), 4);
        let numbers: Vec<_> = download.iter().map(|o| o.order_number.as_str()).collect();
        assert_eq!(numbers, vec!["1", "2", "3", "4"]);
        assert!(download.iter().all(|o| o.status == OrderStatus::Working));
    }

    #[test]
    fn book_events_keep_quantities_consistent() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut book = SimBook::new("SIM1".into(), dec!(1475), dec!(0.25));
        book.seed(3, &mut rng);

        for _ in 0..200 {
            let event = book.next_event(&mut rng);
            for order in event.orders() {
                assert!(order.working_quantity >= 0);
                assert!(order.working_quantity <= order.order_quantity);
            }
            if let OrderEvent::Deleted(order) = &event {
                assert!(book.working().iter().all(|o| o.order_number != order.order_number));
            }
        }
        assert!(book
            .working()
            .iter()
            .all(|o| o.working_quantity > 0));
    }

    #[test]
    fn login_checks_configured_password() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let config = SimConfig {
            password: Some("letmein".into()),
            ..fast_sim()
        };
        let session = SimSession::new(config, EventSink::from_sender(tx));

        assert!(session
            .check_credentials(&Credentials::new("trader", "letmein"))
            .success);
        assert!(!session
            .check_credentials(&Credentials::new("trader", "wrong"))
            .success);
        assert!(!session
            .check_credentials(&Credentials::new(" ", "letmein"))
            .success);
    }

    #[test]
    fn subscriptions_require_login() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let mut session = SimSession::new(fast_sim(), EventSink::from_sender(tx));
        assert!(session.lookup_instrument(&es_key()).is_err());
        assert!(session.subscribe_orders().is_err());
    }

    #[tokio::test]
    async fn lookup_reports_pending_then_found() {
        let dispatcher = Dispatcher::new();
        let handle = dispatcher.handle();
        let mut session = SimSession::new(fast_sim(), handle.sink());
        session.authenticate(&Credentials::new("trader", "secret"));
        let mut lookup = session.lookup_instrument(&es_key()).unwrap();
        lookup.start().unwrap();

        let mut updates = Vec::new();
        let stopper = handle.clone();
        dispatcher
            .run(|event: GatewayEvent| {
                if let GatewayEvent::InstrumentLookup(update) = event {
                    let done = update.is_final;
                    updates.push(update);
                    if done {
                        stopper.begin_shutdown();
                    }
                }
            })
            .await;

        assert_eq!(updates.len(), 2);
        assert!(!updates[0].is_final);
        assert!(updates[0].instrument.is_none());
        assert_eq!(
            updates[1].instrument.as_ref().map(|i| i.name.as_str()),
            Some("ES Mar13")
        );
    }

    #[tokio::test]
    async fn unlisted_contract_fails_finally() {
        let dispatcher = Dispatcher::new();
        let handle = dispatcher.handle();
        let mut session = SimSession::new(fast_sim(), handle.sink());
        session.authenticate(&Credentials::new("trader", "secret"));
        let mut key = es_key();
        key.contract = "Dec99".into();
        let mut lookup = session.lookup_instrument(&key).unwrap();
        lookup.start().unwrap();

        let mut last = None;
        let stopper = handle.clone();
        dispatcher
            .run(|event: GatewayEvent| {
                if let GatewayEvent::InstrumentLookup(update) = event {
                    if update.is_final {
                        last = Some(update);
                        stopper.begin_shutdown();
                    }
                }
            })
            .await;

        let last = last.expect("final update");
        assert!(last.instrument.is_none());
        assert!(last.error.unwrap().contains("Dec99"));
    }

    #[tokio::test]
    async fn order_feed_starts_with_book_download() {
        let dispatcher = Dispatcher::new();
        let handle = dispatcher.handle();
        let mut session = SimSession::new(fast_sim(), handle.sink());
        session.authenticate(&Credentials::new("trader", "secret"));
        let mut feed = session.subscribe_orders().unwrap();
        feed.start().unwrap();

        let mut first = None;
        let stopper = handle.clone();
        dispatcher
            .run(|event: GatewayEvent| {
                if let GatewayEvent::Order(Ok(event)) = event {
                    first.get_or_insert(event);
                    stopper.begin_shutdown();
                }
            })
            .await;
        feed.dispose();

        match first {
            Some(OrderEvent::BookDownload(orders)) => assert_eq!(orders.len(), 3),
            other => panic!("expected book download, got {other:?}"),
        }
    }
}
