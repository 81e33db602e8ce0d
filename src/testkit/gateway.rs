//! Scripted gateway implementations for testing.
//!
//! - [`ScriptedConnector`] - Delivers a scripted initialization outcome.
//! - [`ScriptedSession`] - Answers each login from a queue of statuses and
//!   hands out subscriptions preloaded with scripted events.
//! - [`ScriptedSubscription`] - Emits its events, in order, when started.
//!
//! Every call lands in a shared [`Journal`] so tests can assert exactly what
//! the orchestrator asked of the gateway, and in which order.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::{
    AuthStatus, Credentials, Instrument, InstrumentId, InstrumentKey, OrderEvent, Tick,
};
use crate::error::{Error, Result};
use crate::gateway::{
    Connector, EventSink, GatewayEvent, LookupUpdate, Session, Subscription, SubscriptionKind,
};

/// One gateway call made by the code under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Initialize,
    Authenticate { username: String },
    LookupInstrument(InstrumentKey),
    SubscribeTimeAndSales(InstrumentId),
    SubscribeOrders,
    Start(SubscriptionKind),
    Dispose(SubscriptionKind),
    Shutdown,
}

/// Shared, ordered call log.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Journal {
    pub fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// How many times `call` was made.
    pub fn count(&self, call: &Call) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }
}

/// Canned gateway responses.
#[derive(Debug, Clone, Default)]
pub struct Script {
    init_error: Option<String>,
    auth: VecDeque<AuthStatus>,
    lookup: Vec<LookupUpdate>,
    ticks: Vec<std::result::Result<Vec<Tick>, String>>,
    orders: Vec<std::result::Result<OrderEvent, String>>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialization fails with `reason`.
    pub fn fail_init(mut self, reason: impl Into<String>) -> Self {
        self.init_error = Some(reason.into());
        self
    }

    /// Statuses answered to successive logins; success once exhausted.
    pub fn with_auth(mut self, statuses: Vec<AuthStatus>) -> Self {
        self.auth = statuses.into();
        self
    }

    /// Updates emitted when the instrument lookup starts.
    pub fn with_lookup(mut self, updates: Vec<LookupUpdate>) -> Self {
        self.lookup = updates;
        self
    }

    /// Batches emitted when the time-and-sales feed starts.
    pub fn with_ticks(mut self, batches: Vec<std::result::Result<Vec<Tick>, String>>) -> Self {
        self.ticks = batches;
        self
    }

    /// Events emitted when the order feed starts.
    pub fn with_orders(mut self, events: Vec<std::result::Result<OrderEvent, String>>) -> Self {
        self.orders = events;
        self
    }
}

/// Connector that replays a [`Script`].
pub struct ScriptedConnector {
    script: Script,
    journal: Journal,
}

impl ScriptedConnector {
    pub fn new(script: Script, journal: Journal) -> Self {
        Self { script, journal }
    }
}

impl Connector for ScriptedConnector {
    fn initialize(self: Box<Self>, sink: EventSink) {
        let Self { script, journal } = *self;
        journal.record(Call::Initialize);
        let result: Result<Box<dyn Session>> = match script.init_error.clone() {
            Some(reason) => Err(Error::Init(reason)),
            None => Ok(Box::new(ScriptedSession::new(
                script,
                journal,
                Some(sink.clone()),
            ))),
        };
        sink.emit(GatewayEvent::Initialized(result));
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Session that replays a [`Script`].
///
/// Without a sink it records calls but emits nothing, which lets unit tests
/// feed callbacks by hand.
pub struct ScriptedSession {
    script: Script,
    journal: Journal,
    sink: Option<EventSink>,
}

impl ScriptedSession {
    pub fn new(script: Script, journal: Journal, sink: Option<EventSink>) -> Self {
        Self {
            script,
            journal,
            sink,
        }
    }

    /// A session with an empty script and no sink.
    pub fn detached(journal: Journal) -> Self {
        Self::new(Script::new(), journal, None)
    }

    fn subscription(
        &self,
        kind: SubscriptionKind,
        events: Vec<GatewayEvent>,
    ) -> Box<dyn Subscription> {
        Box::new(ScriptedSubscription {
            kind,
            events,
            sink: self.sink.clone(),
            journal: self.journal.clone(),
        })
    }
}

impl Session for ScriptedSession {
    fn authenticate(&mut self, credentials: &Credentials) {
        self.journal.record(Call::Authenticate {
            username: credentials.username.clone(),
        });
        let status = self.script.auth.pop_front().unwrap_or_else(AuthStatus::success);
        if let Some(sink) = &self.sink {
            sink.emit(GatewayEvent::Authentication(status));
        }
    }

    fn lookup_instrument(&mut self, key: &InstrumentKey) -> Result<Box<dyn Subscription>> {
        self.journal.record(Call::LookupInstrument(key.clone()));
        let events = self
            .script
            .lookup
            .iter()
            .cloned()
            .map(GatewayEvent::InstrumentLookup)
            .collect();
        Ok(self.subscription(SubscriptionKind::InstrumentLookup, events))
    }

    fn subscribe_time_and_sales(
        &mut self,
        instrument: &Instrument,
    ) -> Result<Box<dyn Subscription>> {
        self.journal
            .record(Call::SubscribeTimeAndSales(instrument.id.clone()));
        let events = self
            .script
            .ticks
            .iter()
            .cloned()
            .map(GatewayEvent::TimeAndSales)
            .collect();
        Ok(self.subscription(SubscriptionKind::TimeAndSales, events))
    }

    fn subscribe_orders(&mut self) -> Result<Box<dyn Subscription>> {
        self.journal.record(Call::SubscribeOrders);
        let events = self
            .script
            .orders
            .iter()
            .cloned()
            .map(GatewayEvent::Order)
            .collect();
        Ok(self.subscription(SubscriptionKind::Orders, events))
    }

    fn shutdown(&mut self) {
        self.journal.record(Call::Shutdown);
    }
}

/// Subscription that emits preloaded events on start.
pub struct ScriptedSubscription {
    kind: SubscriptionKind,
    events: Vec<GatewayEvent>,
    sink: Option<EventSink>,
    journal: Journal,
}

impl ScriptedSubscription {
    /// A subscription with nothing to emit.
    pub fn idle(kind: SubscriptionKind, journal: Journal) -> Self {
        Self {
            kind,
            events: Vec::new(),
            sink: None,
            journal,
        }
    }
}

impl Subscription for ScriptedSubscription {
    fn start(&mut self) -> Result<()> {
        self.journal.record(Call::Start(self.kind));
        if let Some(sink) = &self.sink {
            for event in std::mem::take(&mut self.events) {
                sink.emit(event);
            }
        }
        Ok(())
    }

    fn dispose(&mut self) {
        self.journal.record(Call::Dispose(self.kind));
        self.events.clear();
    }

    fn kind(&self) -> SubscriptionKind {
        self.kind
    }
}
