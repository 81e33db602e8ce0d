//! Gateway wire messages.
//!
//! Every frame is a JSON object tagged by `type`. Subscription replies carry
//! the `id` of the request that opened them.
//!
//! ```json
//! {"type":"lookup","id":1,"market":"CME","product_type":"future","product":"ES","contract":"Mar13"}
//! {"type":"lookup","id":1,"final":true,"instrument":{"id":"ES-2013-03","name":"ES Mar13"}}
//! {"type":"trades","id":2,"ticks":[{"price":"1475.25","quantity":3}]}
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::{
    Instrument, InstrumentId, InstrumentKey, Order, OrderEvent, OrderEventKind, Tick,
};
use crate::gateway::LookupUpdate;

/// Requests sent to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Login {
        username: String,
        password: String,
    },
    Lookup {
        id: u64,
        market: String,
        product_type: String,
        product: String,
        contract: String,
    },
    SubscribeTrades {
        id: u64,
        instrument: InstrumentId,
    },
    SubscribeOrders {
        id: u64,
    },
    Unsubscribe {
        id: u64,
    },
    Logout,
}

impl ClientMessage {
    pub fn lookup(id: u64, key: &InstrumentKey) -> Self {
        Self::Lookup {
            id,
            market: key.product.market.as_str().to_string(),
            product_type: key.product.product_type.as_str().to_ascii_lowercase(),
            product: key.product.product.clone(),
            contract: key.contract.clone(),
        }
    }
}

/// Replies and pushes received from the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    LoginStatus {
        success: bool,
        #[serde(default)]
        message: String,
    },
    Lookup {
        id: u64,
        #[serde(rename = "final", default)]
        is_final: bool,
        #[serde(default)]
        instrument: Option<WireInstrument>,
        #[serde(default)]
        error: Option<String>,
    },
    Trades {
        id: u64,
        #[serde(default)]
        ticks: Vec<Tick>,
        #[serde(default)]
        error: Option<String>,
    },
    OrderEvent {
        id: u64,
        event: WireEventKind,
        #[serde(default)]
        orders: Vec<Order>,
        #[serde(default)]
        error: Option<String>,
    },
    /// Heartbeats and anything newer than this client.
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    /// Subscription the message belongs to, if any.
    #[must_use]
    pub const fn subscription_id(&self) -> Option<u64> {
        match self {
            Self::Lookup { id, .. } | Self::Trades { id, .. } | Self::OrderEvent { id, .. } => {
                Some(*id)
            }
            Self::LoginStatus { .. } | Self::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WireInstrument {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Order event names on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireEventKind {
    BookDownload,
    Added,
    Updated,
    Filled,
    Rejected,
    Deleted,
    StatusUnknown,
}

impl From<WireEventKind> for OrderEventKind {
    fn from(kind: WireEventKind) -> Self {
        match kind {
            WireEventKind::BookDownload => Self::BookDownload,
            WireEventKind::Added => Self::Added,
            WireEventKind::Updated => Self::Updated,
            WireEventKind::Filled => Self::Filled,
            WireEventKind::Rejected => Self::Rejected,
            WireEventKind::Deleted => Self::Deleted,
            WireEventKind::StatusUnknown => Self::StatusUnknown,
        }
    }
}

/// Build a lookup update for a request made with `key`.
pub fn lookup_update(
    key: &InstrumentKey,
    is_final: bool,
    instrument: Option<WireInstrument>,
    error: Option<String>,
) -> LookupUpdate {
    let instrument = instrument.map(|wire| {
        let mut resolved = Instrument::new(InstrumentId::new(wire.id), key.clone());
        if let Some(name) = wire.name {
            resolved.name = name;
        }
        resolved
    });
    LookupUpdate {
        instrument,
        error,
        is_final,
    }
}

/// Turn an `order_event` payload into a domain event.
///
/// A single-order event must carry exactly one order.
pub fn order_event(
    kind: WireEventKind,
    mut orders: Vec<Order>,
    error: Option<String>,
) -> Result<OrderEvent, String> {
    if let Some(error) = error {
        return Err(error);
    }
    match OrderEventKind::from(kind) {
        OrderEventKind::BookDownload => Ok(OrderEvent::BookDownload(orders)),
        kind if orders.len() == 1 => Ok(OrderEvent::single(kind, orders.remove(0))),
        kind => Err(format!("{kind} carried {} orders", orders.len())),
    }
}

/// Turn a `trades` payload into a tick batch.
pub fn trades(ticks: Vec<Tick>, error: Option<String>) -> Result<Vec<Tick>, String> {
    match error {
        Some(error) => Err(error),
        None => Ok(ticks),
    }
}
