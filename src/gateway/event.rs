//! Gateway callbacks as messages.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

use super::Session;
use crate::domain::{AuthStatus, Instrument, OrderEvent, Tick};
use crate::error::Result;

/// One instrument lookup callback.
///
/// The gateway may keep searching after a miss; only an update with
/// `is_final` set ends the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupUpdate {
    pub instrument: Option<Instrument>,
    pub error: Option<String>,
    pub is_final: bool,
}

impl LookupUpdate {
    /// The instrument was found.
    pub fn found(instrument: Instrument) -> Self {
        Self {
            instrument: Some(instrument),
            error: None,
            is_final: true,
        }
    }

    /// Not found yet; the gateway is still searching.
    pub fn pending(reason: impl Into<String>) -> Self {
        Self {
            instrument: None,
            error: Some(reason.into()),
            is_final: false,
        }
    }

    /// The gateway gave up.
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self {
            instrument: None,
            error: Some(reason.into()),
            is_final: true,
        }
    }
}

/// Every callback a gateway can deliver.
pub enum GatewayEvent {
    Initialized(Result<Box<dyn Session>>),
    Authentication(AuthStatus),
    InstrumentLookup(LookupUpdate),
    /// A batch of one or more trade prints, or a delivery error.
    TimeAndSales(std::result::Result<Vec<Tick>, String>),
    Order(std::result::Result<OrderEvent, String>),
}

impl fmt::Debug for GatewayEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initialized(Ok(_)) => f.write_str("Initialized(Ok(<session>))"),
            Self::Initialized(Err(e)) => write!(f, "Initialized(Err({e}))"),
            Self::Authentication(status) => write!(f, "Authentication({status:?})"),
            Self::InstrumentLookup(update) => write!(f, "InstrumentLookup({update:?})"),
            Self::TimeAndSales(batch) => write!(f, "TimeAndSales({batch:?})"),
            Self::Order(event) => write!(f, "Order({event:?})"),
        }
    }
}

/// Where a gateway posts its callbacks.
///
/// Cloneable and thread-safe; backends may emit from any task or thread.
#[derive(Clone)]
pub struct EventSink {
    emit: Arc<dyn Fn(GatewayEvent) -> bool + Send + Sync>,
}

impl EventSink {
    pub fn new<F>(emit: F) -> Self
    where
        F: Fn(GatewayEvent) -> bool + Send + Sync + 'static,
    {
        Self {
            emit: Arc::new(emit),
        }
    }

    /// Sink that forwards into an unbounded channel.
    pub fn from_sender(tx: mpsc::UnboundedSender<GatewayEvent>) -> Self {
        Self::new(move |event| tx.send(event).is_ok())
    }

    /// Post an event. Returns `false` once the receiving loop is gone.
    pub fn emit(&self, event: GatewayEvent) -> bool {
        (self.emit)(event)
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EventSink")
    }
}
