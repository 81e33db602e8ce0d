//! JSON-over-WebSocket gateway client.
//!
//! # Connection lifecycle
//!
//! 1. [`WsConnector::initialize`] connects and reports the session.
//! 2. A writer task drains an outbound queue into the socket; a reader task
//!    parses frames and posts them to the [`EventSink`].
//! 3. Each subscription owns a request id. Replies for ids that are not live
//!    (never started, or already disposed) are dropped.
//! 4. [`Session::shutdown`] logs out, closes the socket and stops the reader.
//!
//! There is no reconnection: a dropped connection ends every feed.

pub mod message;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use self::message::{ClientMessage, ServerMessage};
use super::{
    Connector, EventSink, GatewayEvent, Session, Subscription, SubscriptionKind,
};
use crate::domain::{AuthStatus, Credentials, Instrument, InstrumentKey};
use crate::error::{Error, Result};

/// Connector for a WebSocket gateway at `url`.
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    #[must_use]
    pub const fn new(url: String) -> Self {
        Self { url }
    }
}

impl Connector for WsConnector {
    fn initialize(self: Box<Self>, sink: EventSink) {
        tokio::spawn(async move {
            let result = WsSession::connect(&self.url, sink.clone())
                .await
                .map(|session| Box::new(session) as Box<dyn Session>)
                .map_err(|e| Error::Init(e.to_string()));
            sink.emit(GatewayEvent::Initialized(result));
        });
    }

    fn name(&self) -> &'static str {
        "websocket"
    }
}

/// What a live subscription id expects back.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Route {
    Lookup(InstrumentKey),
    Trades,
    Orders,
}

/// Live subscription ids, shared by the session and the reader task.
#[derive(Debug, Default)]
pub(crate) struct Routes {
    live: HashMap<u64, Route>,
}

impl Routes {
    fn open(&mut self, id: u64, route: Route) {
        self.live.insert(id, route);
    }

    fn close(&mut self, id: u64) -> bool {
        self.live.remove(&id).is_some()
    }

    /// Translate a server message, or `None` if nobody is listening.
    fn route(&self, msg: ServerMessage) -> Option<GatewayEvent> {
        if let ServerMessage::LoginStatus { success, message } = msg {
            let status = if success {
                AuthStatus::success()
            } else {
                AuthStatus::failed(message)
            };
            return Some(GatewayEvent::Authentication(status));
        }

        let id = msg.subscription_id()?;
        let Some(route) = self.live.get(&id) else {
            trace!(id, "Dropping reply for closed subscription");
            return None;
        };

        match (route, msg) {
            (
                Route::Lookup(key),
                ServerMessage::Lookup {
                    is_final,
                    instrument,
                    error,
                    ..
                },
            ) => Some(GatewayEvent::InstrumentLookup(message::lookup_update(
                key, is_final, instrument, error,
            ))),
            (Route::Trades, ServerMessage::Trades { ticks, error, .. }) => Some(
                GatewayEvent::TimeAndSales(message::trades(ticks, error)),
            ),
            (
                Route::Orders,
                ServerMessage::OrderEvent {
                    event,
                    orders,
                    error,
                    ..
                },
            ) => Some(GatewayEvent::Order(message::order_event(
                event, orders, error,
            ))),
            (route, other) => {
                warn!(id, ?route, message = ?other, "Reply does not match subscription");
                None
            }
        }
    }
}

type Outbound = mpsc::UnboundedSender<Message>;

fn send(tx: &Outbound, message: &ClientMessage) -> Result<()> {
    let json = serde_json::to_string(message)?;
    tx.send(Message::Text(json))
        .map_err(|_| Error::Gateway("connection closed".into()))
}

pub struct WsSession {
    tx: Outbound,
    sink: EventSink,
    routes: Arc<Mutex<Routes>>,
    next_id: Arc<AtomicU64>,
    reader: JoinHandle<()>,
    closed: bool,
}

impl WsSession {
    /// Connect and start the reader and writer tasks.
    pub async fn connect(url: &str, sink: EventSink) -> Result<Self> {
        let url = Url::parse(url)?;
        // Another component may have installed a provider already.
        let _ = rustls::crypto::ring::default_provider().install_default();
        info!(url = %url, "Connecting to gateway");
        let (ws, response) = connect_async(url.as_str()).await?;
        info!(status = %response.status(), "Gateway connected");

        let (mut write, mut read) = ws.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

        tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                let closing = matches!(frame, Message::Close(_));
                if let Err(e) = write.send(frame).await {
                    debug!(error = %e, "Gateway writer stopped");
                    break;
                }
                if closing {
                    break;
                }
            }
        });

        let routes = Arc::new(Mutex::new(Routes::default()));
        let reader_routes = Arc::clone(&routes);
        let pong = tx.clone();
        let reader_sink = sink.clone();
        let reader = tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        trace!(bytes = text.len(), "Received gateway frame");
                        let parsed = match serde_json::from_str::<ServerMessage>(&text) {
                            Ok(parsed) => parsed,
                            Err(e) => {
                                warn!(error = %e, bytes = text.len(), "Failed to parse message");
                                continue;
                            }
                        };
                        let event = reader_routes.lock().route(parsed);
                        if let Some(event) = event {
                            if !reader_sink.emit(event) {
                                break;
                            }
                        }
                    }
                    Ok(Message::Ping(data)) => {
                        if pong.send(Message::Pong(data)).is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(frame)) => {
                        info!(frame = ?frame, "Gateway closed the connection");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!(error = %e, "Gateway connection error");
                        break;
                    }
                }
            }
        });

        Ok(Self {
            tx,
            sink,
            routes,
            next_id: Arc::new(AtomicU64::new(1)),
            reader,
            closed: false,
        })
    }

    fn subscription(
        &self,
        kind: SubscriptionKind,
        route: Route,
        request: impl FnOnce(u64) -> ClientMessage,
    ) -> Result<Box<dyn Subscription>> {
        if self.closed {
            return Err(Error::Gateway("session is shut down".into()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(WsSubscription {
            id,
            kind,
            pending: Some((route, request(id))),
            started: false,
            tx: self.tx.clone(),
            routes: Arc::clone(&self.routes),
        }))
    }
}

impl Session for WsSession {
    fn authenticate(&mut self, credentials: &Credentials) {
        let login = ClientMessage::Login {
            username: credentials.username.clone(),
            password: credentials.password.clone(),
        };
        if let Err(e) = send(&self.tx, &login) {
            // No reply will come; fail the login locally.
            warn!(error = %e, "Could not send login");
            self.sink
                .emit(GatewayEvent::Authentication(AuthStatus::failed(e.to_string())));
        }
    }

    fn lookup_instrument(&mut self, key: &InstrumentKey) -> Result<Box<dyn Subscription>> {
        let request_key = key.clone();
        self.subscription(
            SubscriptionKind::InstrumentLookup,
            Route::Lookup(key.clone()),
            move |id| ClientMessage::lookup(id, &request_key),
        )
    }

    fn subscribe_time_and_sales(
        &mut self,
        instrument: &Instrument,
    ) -> Result<Box<dyn Subscription>> {
        let instrument = instrument.id.clone();
        self.subscription(SubscriptionKind::TimeAndSales, Route::Trades, move |id| {
            ClientMessage::SubscribeTrades { id, instrument }
        })
    }

    fn subscribe_orders(&mut self) -> Result<Box<dyn Subscription>> {
        self.subscription(SubscriptionKind::Orders, Route::Orders, |id| {
            ClientMessage::SubscribeOrders { id }
        })
    }

    fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.routes.lock().live.clear();
        let _ = send(&self.tx, &ClientMessage::Logout);
        let _ = self.tx.send(Message::Close(None));
        self.reader.abort();
        info!("Gateway session closed");
    }
}

impl Drop for WsSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct WsSubscription {
    id: u64,
    kind: SubscriptionKind,
    pending: Option<(Route, ClientMessage)>,
    started: bool,
    tx: Outbound,
    routes: Arc<Mutex<Routes>>,
}

impl Subscription for WsSubscription {
    fn start(&mut self) -> Result<()> {
        let (route, request) = self.pending.take().ok_or_else(|| {
            Error::Gateway(format!("{} subscription already started", self.kind))
        })?;
        self.routes.lock().open(self.id, route);
        if let Err(e) = send(&self.tx, &request) {
            self.routes.lock().close(self.id);
            return Err(e);
        }
        self.started = true;
        debug!(id = self.id, kind = %self.kind, "Subscription started");
        Ok(())
    }

    fn dispose(&mut self) {
        self.pending = None;
        let was_live = self.routes.lock().close(self.id);
        if self.started && was_live {
            let _ = send(&self.tx, &ClientMessage::Unsubscribe { id: self.id });
            debug!(id = self.id, kind = %self.kind, "Subscription disposed");
        }
        self.started = false;
    }

    fn kind(&self) -> SubscriptionKind {
        self.kind
    }
}

impl Drop for WsSubscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::message::WireEventKind;
    use super::*;
    use crate::domain::OrderEvent;
    use crate::testkit::domain::{es_key, order, tick};

    fn lookup(id: u64, is_final: bool) -> ServerMessage {
        ServerMessage::Lookup {
            id,
            is_final,
            instrument: None,
            error: Some("not yet".into()),
        }
    }

    #[test]
    fn login_status_always_routes() {
        let routes = Routes::default();
        let event = routes.route(ServerMessage::LoginStatus {
            success: false,
            message: "locked".into(),
        });
        match event {
            Some(GatewayEvent::Authentication(status)) => {
                assert!(!status.success);
                assert_eq!(status.message, "locked");
            }
            other => panic!("expected authentication, got {other:?}"),
        }
    }

    #[test]
    fn replies_for_unknown_ids_are_dropped() {
        let mut routes = Routes::default();
        assert!(routes.route(lookup(1, false)).is_none());

        routes.open(1, Route::Lookup(es_key()));
        assert!(routes.route(lookup(1, false)).is_some());

        assert!(routes.close(1));
        assert!(routes.route(lookup(1, true)).is_none());
        assert!(!routes.close(1));
    }

    #[test]
    fn routes_by_subscription_kind() {
        let mut routes = Routes::default();
        routes.open(2, Route::Trades);
        routes.open(3, Route::Orders);

        let trades = routes.route(ServerMessage::Trades {
            id: 2,
            ticks: vec![tick("1475.25", 1)],
            error: None,
        });
        assert!(matches!(trades, Some(GatewayEvent::TimeAndSales(Ok(ref t))) if t.len() == 1));

        let orders = routes.route(ServerMessage::OrderEvent {
            id: 3,
            event: WireEventKind::Deleted,
            orders: vec![order("9")],
            error: None,
        });
        match orders {
            Some(GatewayEvent::Order(Ok(OrderEvent::Deleted(o)))) => {
                assert_eq!(o.order_number, "9");
            }
            other => panic!("expected deleted order, got {other:?}"),
        }
    }

    #[test]
    fn mismatched_reply_is_ignored() {
        let mut routes = Routes::default();
        routes.open(2, Route::Trades);
        assert!(routes.route(lookup(2, true)).is_none());
    }
}
