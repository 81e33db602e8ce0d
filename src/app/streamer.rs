//! Console time-and-sales streamer.
//!
//! Drives one session through initialize, login, instrument lookup and the
//! trade-print feed, printing one line per tick. Any terminal error is logged
//! and tears everything down; nothing is retried.

use std::io::Write;

use tracing::{error, info, warn};

use super::lookup::{Lookup, Transition};
use super::teardown::Resources;
use crate::dispatcher::{Dispatcher, DispatcherHandle};
use crate::domain::{AuthStatus, Credentials, Instrument, InstrumentKey, Tick};
use crate::error::{Error, Result};
use crate::gateway::{Connector, EventSink, GatewayEvent, LookupUpdate, Session, Subscription};

/// Where the streamer is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamerStage {
    Idle,
    Initializing,
    Authenticating,
    Resolving,
    Streaming,
    Stopped,
}

pub struct Streamer<W: Write> {
    credentials: Credentials,
    key: InstrumentKey,
    sink: EventSink,
    resources: Resources<GatewayEvent>,
    lookup: Lookup,
    stage: StreamerStage,
    out: W,
    ticks: u64,
    failure: Option<Error>,
}

impl<W: Write> Streamer<W> {
    pub fn new(
        dispatcher: &DispatcherHandle<GatewayEvent>,
        credentials: Credentials,
        key: InstrumentKey,
        out: W,
    ) -> Self {
        Self {
            credentials,
            key,
            sink: dispatcher.sink(),
            resources: Resources::new(dispatcher.clone()),
            lookup: Lookup::new(),
            stage: StreamerStage::Idle,
            out,
            ticks: 0,
            failure: None,
        }
    }

    /// Request gateway initialization. The outcome arrives on the loop.
    pub fn start(&mut self, connector: Box<dyn Connector>) {
        if self.stage != StreamerStage::Idle {
            warn!(stage = ?self.stage, "Streamer already started");
            return;
        }
        info!(gateway = connector.name(), "Initializing gateway");
        self.stage = StreamerStage::Initializing;
        connector.initialize(self.sink.clone());
    }

    /// Handle one gateway callback.
    pub fn handle(&mut self, event: GatewayEvent) {
        if self.stage == StreamerStage::Stopped {
            return;
        }
        match event {
            GatewayEvent::Initialized(result) => self.on_initialized(result),
            GatewayEvent::Authentication(status) => self.on_authentication(status),
            GatewayEvent::InstrumentLookup(update) => self.on_lookup(update),
            GatewayEvent::TimeAndSales(batch) => self.on_ticks(batch),
            GatewayEvent::Order(_) => {}
        }
    }

    fn on_initialized(&mut self, result: Result<Box<dyn Session>>) {
        if self.stage != StreamerStage::Initializing {
            warn!(stage = ?self.stage, "Unexpected initialization result");
            if let Ok(mut stray) = result {
                stray.shutdown();
            }
            return;
        }
        match result {
            Ok(mut session) => {
                info!(user = %self.credentials.username, "Gateway initialized, authenticating");
                session.authenticate(&self.credentials);
                self.resources.set_session(session);
                self.stage = StreamerStage::Authenticating;
            }
            Err(e) => {
                let reason = match e {
                    Error::Init(reason) => reason,
                    other => other.to_string(),
                };
                self.say(&format!("Gateway initialization failed: {reason}"));
                self.fail(Error::Init(reason));
            }
        }
    }

    fn on_authentication(&mut self, status: AuthStatus) {
        if self.stage != StreamerStage::Authenticating {
            warn!(stage = ?self.stage, %status, "Unexpected authentication status");
            return;
        }
        if !status.success {
            self.say(&format!("Login failed: {}", status.message));
            self.fail(Error::Auth(status.message));
            return;
        }

        info!(instrument = %self.key, "Login succeeded, looking up instrument");
        let Some(session) = self.resources.session_mut() else {
            self.fail(Error::Gateway("authenticated without a session".into()));
            return;
        };
        let created = session.lookup_instrument(&self.key);
        match self.start_tracked(created) {
            Ok(()) => self.stage = StreamerStage::Resolving,
            Err(e) => {
                self.say(&format!("Instrument lookup failed: {e}"));
                self.fail(e);
            }
        }
    }

    fn on_lookup(&mut self, update: LookupUpdate) {
        match self.lookup.apply(update) {
            Transition::Resolved(instrument) => {
                self.say(&format!("Found: {}", instrument.name));
                self.subscribe(&instrument);
            }
            Transition::Failed(reason) => {
                self.say(&format!("Cannot find instrument: {reason}"));
                self.fail(Error::InstrumentNotFound(reason));
            }
            Transition::Wait | Transition::Ignored => {}
        }
    }

    fn subscribe(&mut self, instrument: &Instrument) {
        let Some(session) = self.resources.session_mut() else {
            self.fail(Error::Gateway("no session for time-and-sales".into()));
            return;
        };
        let created = session.subscribe_time_and_sales(instrument);
        match self.start_tracked(created) {
            Ok(()) => {
                info!(instrument = %instrument.name, "Streaming time and sales");
                self.stage = StreamerStage::Streaming;
            }
            Err(e) => {
                self.say(&format!("Time and sales subscription failed: {e}"));
                self.fail(e);
            }
        }
    }

    /// Start a freshly created subscription and hand it to teardown, even
    /// when starting fails.
    fn start_tracked(&mut self, created: Result<Box<dyn Subscription>>) -> Result<()> {
        let mut subscription = created?;
        let started = subscription.start();
        self.resources.track(subscription);
        started
    }

    fn on_ticks(&mut self, batch: std::result::Result<Vec<Tick>, String>) {
        if self.stage != StreamerStage::Streaming {
            warn!(stage = ?self.stage, "Ticks before the feed was subscribed");
            return;
        }
        match batch {
            // More than one print may arrive in a single callback.
            Ok(ticks) => {
                for tick in ticks {
                    self.say(&tick.to_string());
                    self.ticks += 1;
                }
            }
            Err(reason) => warn!(error = %Error::Delivery(reason), "Dropped tick batch"),
        }
    }

    fn say(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{line}") {
            error!(error = %e, "Failed to write output");
        }
    }

    fn fail(&mut self, err: Error) {
        error!(error = %err, "Stopping streamer");
        self.failure = Some(err);
        self.shutdown();
    }

    /// Tear everything down. Returns `true` on the call that did the work.
    pub fn shutdown(&mut self) -> bool {
        self.stage = StreamerStage::Stopped;
        let _ = self.out.flush();
        self.resources.dispose()
    }

    #[must_use]
    pub const fn stage(&self) -> StreamerStage {
        self.stage
    }

    #[must_use]
    pub const fn failure(&self) -> Option<&Error> {
        self.failure.as_ref()
    }

    #[must_use]
    pub const fn ticks_printed(&self) -> u64 {
        self.ticks
    }

    #[must_use]
    pub const fn output(&self) -> &W {
        &self.out
    }

    /// Consume the streamer, returning the terminal error if there was one.
    pub fn finish(mut self) -> Result<()> {
        self.shutdown();
        match self.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Run a streamer to completion on `dispatcher`.
///
/// Returns when a terminal error tears the session down or when someone
/// holding a handle to the loop requests shutdown.
pub async fn run_streamer<W: Write>(
    dispatcher: Dispatcher<GatewayEvent>,
    connector: Box<dyn Connector>,
    credentials: Credentials,
    key: InstrumentKey,
    out: W,
) -> Result<()> {
    let mut streamer = Streamer::new(&dispatcher.handle(), credentials, key, out);
    streamer.start(connector);
    dispatcher.run(|event| streamer.handle(event)).await;
    info!(ticks = streamer.ticks_printed(), "Streamer finished");
    streamer.finish()
}
