//! Gateway-agnostic domain types.
//!
//! Everything here is owned by the venue gateway; the client only consumes
//! it. Nothing is persisted.

mod auth;
mod id;
mod instrument;
mod money;
mod order;
mod tick;

pub use auth::{AuthStatus, Credentials};
pub use id::{InstrumentId, SiteOrderKey};
pub use instrument::{Instrument, InstrumentKey, MarketKey, ProductKey, ProductType};
pub use money::{Price, Quantity};
pub use order::{BuySell, Order, OrderAction, OrderEvent, OrderEventKind, OrderStatus};
pub use tick::Tick;
