//! Client orchestrators.
//!
//! - [`streamer`] - console time-and-sales streamer
//! - [`monitor`] - order monitor with a live audit log
//!
//! Both share the same skeleton: event loop, login, resolve/subscribe,
//! stream callbacks, teardown.

pub mod audit;
pub mod lookup;
pub mod monitor;
pub mod streamer;
pub mod teardown;
pub mod view;

pub use audit::{AuditLog, AuditRow, AUDIT_COLUMNS};
pub use lookup::{Lookup, LookupState, Transition};
pub use monitor::{run_monitor, MonitorMessage, MonitorPhase, OrderMonitor};
pub use streamer::{run_streamer, Streamer, StreamerStage};
pub use teardown::Resources;
pub use view::{MonitorView, UiHandle, ViewCommand};
