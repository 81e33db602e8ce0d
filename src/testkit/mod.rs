//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`gateway`] - Scripted [`Connector`](crate::gateway::Connector),
//!   [`Session`](crate::gateway::Session) and
//!   [`Subscription`](crate::gateway::Subscription) that replay canned
//!   responses and journal every call.
//! - [`view`] - `RecordingView`, a [`MonitorView`](crate::app::MonitorView)
//!   that keeps every command for assertions.
//! - [`domain`] - Builders for instruments, ticks and orders.
//! - [`config`] - Canonical test configurations.

pub mod config;
pub mod domain;
pub mod gateway;
pub mod view;
