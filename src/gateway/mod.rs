//! Venue gateway capability traits.
//!
//! The gateway is an opaque collaborator: it owns the session, the
//! subscription engine and the wire protocol. The client reaches it through
//! three capabilities and receives every callback as a [`GatewayEvent`]
//! posted to an [`EventSink`].
//!
//! - [`Connector`] - one-shot initialization producing a [`Session`]
//! - [`Session`] - authentication plus the subscription factories
//! - [`Subscription`] - an explicitly started feed, live until disposed

mod event;
pub mod sim;
pub mod ws;

use std::fmt;

pub use event::{EventSink, GatewayEvent, LookupUpdate};

use crate::domain::{Credentials, Instrument, InstrumentKey};
use crate::error::Result;

/// What a subscription delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionKind {
    InstrumentLookup,
    TimeAndSales,
    Orders,
}

impl fmt::Display for SubscriptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InstrumentLookup => "instrument-lookup",
            Self::TimeAndSales => "time-and-sales",
            Self::Orders => "orders",
        })
    }
}

/// Entry point of a gateway backend.
pub trait Connector: Send {
    /// Begin initialization.
    ///
    /// Exactly one [`GatewayEvent::Initialized`] is posted to `sink`,
    /// carrying either a usable session or the initialization error.
    fn initialize(self: Box<Self>, sink: EventSink);

    /// Backend name for logging.
    fn name(&self) -> &'static str;
}

/// An initialized gateway connection.
pub trait Session: Send {
    /// Submit credentials. Exactly one [`GatewayEvent::Authentication`]
    /// follows per call.
    fn authenticate(&mut self, credentials: &Credentials);

    /// Create an instrument lookup for `key`. Updates arrive as
    /// [`GatewayEvent::InstrumentLookup`] once started.
    fn lookup_instrument(&mut self, key: &InstrumentKey) -> Result<Box<dyn Subscription>>;

    /// Create a trade-print feed for a resolved instrument.
    fn subscribe_time_and_sales(&mut self, instrument: &Instrument)
        -> Result<Box<dyn Subscription>>;

    /// Create an order feed scoped to the authenticated session.
    fn subscribe_orders(&mut self) -> Result<Box<dyn Subscription>>;

    /// Release the session. Safe to call more than once.
    fn shutdown(&mut self);
}

/// A live feed registration.
pub trait Subscription: Send {
    /// Start delivering events.
    fn start(&mut self) -> Result<()>;

    /// Stop delivering events and release the registration. Safe to call
    /// more than once.
    fn dispose(&mut self);

    fn kind(&self) -> SubscriptionKind;
}
