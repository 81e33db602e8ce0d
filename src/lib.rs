//! Gatewire - console clients for an asynchronous trading gateway.
//!
//! Two small clients share one event-driven core:
//!
//! - a market-data streamer that logs in, resolves an instrument and prints
//!   its trades, and
//! - an order monitor that logs in and keeps a live audit log of order
//!   lifecycle events.
//!
//! Every gateway callback is posted as a message onto a single-threaded
//! [`dispatcher::Dispatcher`], so the orchestrators in [`app`] never lock.
//!
//! # Modules
//!
//! - [`dispatcher`] - the cooperative event loop and its thread-safe handle
//! - [`gateway`] - capability traits plus the simulated and WebSocket backends
//! - [`app`] - streamer and monitor orchestration, lookup, teardown, audit
//! - [`domain`] - instruments, ticks, orders and credentials
//! - [`config`] - TOML configuration with environment credentials
//! - [`cli`] - command-line front end
//!
//! # Example
//!
//! ```no_run
//! use gatewire::app::run_streamer;
//! use gatewire::config::Config;
//! use gatewire::dispatcher::Dispatcher;
//! use gatewire::domain::Credentials;
//! use gatewire::gateway::sim::SimConnector;
//!
//! # async fn demo() -> gatewire::error::Result<()> {
//! let config = Config::default();
//! run_streamer(
//!     Dispatcher::new(),
//!     Box::new(SimConnector::new(config.sim.clone())),
//!     Credentials::new("trader", "secret"),
//!     config.instrument.key(),
//!     std::io::stdout(),
//! )
//! .await
//! # }
//! ```

pub mod app;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod error;
pub mod gateway;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
