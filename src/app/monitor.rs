//! Order monitor: a login form and a live audit log of order events.
//!
//! The session is handed in from outside. Login failures are shown to the
//! user and the login control is re-armed for another attempt; nothing is
//! retried automatically.

use tracing::{debug, error, info, warn};

use super::audit::{rows_for, AUDIT_COLUMNS};
use super::teardown::Resources;
use super::view::MonitorView;
use crate::dispatcher::{Dispatcher, DispatcherHandle};
use crate::domain::{AuthStatus, Credentials, OrderEvent};
use crate::error::{Error, Result};
use crate::gateway::{Connector, GatewayEvent, Session};

/// Everything the monitor's loop can receive.
#[derive(Debug)]
pub enum MonitorMessage {
    Gateway(GatewayEvent),
    /// The user pressed "connect".
    Login(Credentials),
    /// The user closed the form.
    Close,
}

impl From<GatewayEvent> for MonitorMessage {
    fn from(event: GatewayEvent) -> Self {
        Self::Gateway(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorPhase {
    AwaitingSession,
    LoggedOut,
    Authenticating,
    LoggedIn,
    Closed,
}

pub struct OrderMonitor<V: MonitorView> {
    view: V,
    resources: Resources<MonitorMessage>,
    phase: MonitorPhase,
    rows: usize,
}

impl<V: MonitorView> OrderMonitor<V> {
    /// Build the form and lay out the audit log columns.
    pub fn new(dispatcher: &DispatcherHandle<MonitorMessage>, mut view: V) -> Self {
        view.show_columns(&AUDIT_COLUMNS);
        view.set_login_enabled(false);
        Self {
            view,
            resources: Resources::new(dispatcher.clone()),
            phase: MonitorPhase::AwaitingSession,
            rows: 0,
        }
    }

    /// Accept the outcome of gateway initialization performed elsewhere.
    pub fn attach(&mut self, result: Result<Box<dyn Session>>) {
        if self.phase != MonitorPhase::AwaitingSession {
            warn!(phase = ?self.phase, "Session already attached");
            if let Ok(mut session) = result {
                session.shutdown();
            }
            return;
        }
        match result {
            Ok(session) => {
                self.resources.set_session(session);
                self.phase = MonitorPhase::LoggedOut;
                self.view.set_login_enabled(true);
                self.set_status("Gateway ready, please log in");
            }
            Err(e) => {
                error!(error = %e, "Gateway initialization failed");
                let reason = match e {
                    Error::Init(reason) => reason,
                    other => other.to_string(),
                };
                self.set_status(&format!("Gateway initialization failed: {reason}"));
            }
        }
    }

    /// Handle one message from the loop.
    pub fn handle(&mut self, message: MonitorMessage) {
        if self.phase == MonitorPhase::Closed {
            return;
        }
        match message {
            MonitorMessage::Gateway(GatewayEvent::Initialized(result)) => self.attach(result),
            MonitorMessage::Gateway(GatewayEvent::Authentication(status)) => {
                self.on_authentication(status);
            }
            MonitorMessage::Gateway(GatewayEvent::Order(event)) => self.on_order(event),
            MonitorMessage::Gateway(other) => debug!(event = ?other, "Ignoring gateway event"),
            MonitorMessage::Login(credentials) => self.submit_login(&credentials),
            MonitorMessage::Close => {
                self.close();
            }
        }
    }

    /// Validate the form and submit credentials.
    pub fn submit_login(&mut self, credentials: &Credentials) {
        if self.phase != MonitorPhase::LoggedOut {
            debug!(phase = ?self.phase, "Login control disabled, ignoring submit");
            return;
        }
        if credentials.username.trim().is_empty() {
            self.view.show_message("Login", "Please enter a username");
            return;
        }
        if credentials.password.is_empty() {
            self.view.show_message("Login", "Please enter a password");
            return;
        }
        let Some(session) = self.resources.session_mut() else {
            self.set_status("No gateway session");
            return;
        };

        info!(user = %credentials.username, "Submitting credentials");
        session.authenticate(credentials);
        self.phase = MonitorPhase::Authenticating;
        self.view.set_login_enabled(false);
    }

    fn on_authentication(&mut self, status: AuthStatus) {
        if self.phase != MonitorPhase::Authenticating {
            warn!(phase = ?self.phase, %status, "Unexpected authentication status");
            return;
        }
        if !status.success {
            warn!(reason = %status.message, "Login unsuccessful");
            self.view.show_message(
                "Error",
                &format!("Login Unsuccessful.\n\nReason: {}", status.message),
            );
            self.phase = MonitorPhase::LoggedOut;
            self.view.set_login_enabled(true);
            return;
        }

        self.phase = MonitorPhase::LoggedIn;
        match self.subscribe_orders() {
            Ok(()) => self.set_status(&format!("Login Status: {status}")),
            Err(e) => {
                error!(error = %e, "Order subscription failed");
                self.set_status(&format!("Order subscription failed: {e}"));
            }
        }
    }

    fn subscribe_orders(&mut self) -> Result<()> {
        let session = self
            .resources
            .session_mut()
            .ok_or_else(|| Error::Gateway("no session for order feed".into()))?;
        let mut feed = session.subscribe_orders()?;
        let started = feed.start();
        self.resources.track(feed);
        started
    }

    fn on_order(&mut self, event: std::result::Result<OrderEvent, String>) {
        match event {
            Ok(event) => {
                let rows = rows_for(&event);
                debug!(kind = %event.kind(), rows = rows.len(), "Order event");
                self.rows += rows.len();
                for row in rows {
                    self.view.append_row(row);
                }
            }
            Err(reason) => {
                warn!(error = %Error::Delivery(reason.clone()), "Order event error");
                self.set_status(&format!("Order feed error: {reason}"));
            }
        }
    }

    /// Status bar text is mirrored to the log.
    fn set_status(&mut self, text: &str) {
        info!(status = text, "Status");
        self.view.set_status(text);
    }

    /// Close the form, releasing the feed, the session and the loop.
    ///
    /// The gateway vendor's sample form left its order feed and session
    /// registered on close; here both are released in teardown order.
    pub fn close(&mut self) -> bool {
        if self.phase == MonitorPhase::Closed {
            return false;
        }
        self.phase = MonitorPhase::Closed;
        let released = self.resources.dispose();
        self.view.close();
        released
    }

    #[must_use]
    pub const fn phase(&self) -> MonitorPhase {
        self.phase
    }

    /// Audit rows appended so far.
    #[must_use]
    pub const fn rows_appended(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub const fn view(&self) -> &V {
        &self.view
    }
}

/// Run a monitor until the form is closed.
///
/// Initialization is started here and its outcome handed to the monitor,
/// the same as if the session had been created by the caller.
pub async fn run_monitor<V: MonitorView>(
    dispatcher: Dispatcher<MonitorMessage>,
    connector: Box<dyn Connector>,
    view: V,
) -> usize {
    let handle = dispatcher.handle();
    let mut monitor = OrderMonitor::new(&handle, view);
    info!(gateway = connector.name(), "Initializing gateway");
    connector.initialize(handle.sink());
    drop(handle);

    dispatcher.run(|message| monitor.handle(message)).await;
    monitor.close();
    info!(rows = monitor.rows_appended(), "Order monitor closed");
    monitor.rows_appended()
}
