//! Ordered, idempotent release of gateway resources.

use tracing::{debug, info};

use crate::dispatcher::DispatcherHandle;
use crate::gateway::{Session, Subscription};

/// Everything an orchestrator must release on shutdown.
///
/// Disposal runs subscriptions first (newest first), then the session, then
/// the event loop. Subscriptions and sessions hold back-references to the
/// session and loop, so the order is fixed.
pub struct Resources<M> {
    subscriptions: Vec<Box<dyn Subscription>>,
    session: Option<Box<dyn Session>>,
    dispatcher: Option<DispatcherHandle<M>>,
    disposed: bool,
}

impl<M> Resources<M> {
    pub fn new(dispatcher: DispatcherHandle<M>) -> Self {
        Self {
            subscriptions: Vec::new(),
            session: None,
            dispatcher: Some(dispatcher),
            disposed: false,
        }
    }

    /// Take ownership of the session.
    ///
    /// A session that arrives after disposal is shut down immediately.
    pub fn set_session(&mut self, mut session: Box<dyn Session>) {
        if self.disposed {
            debug!("Session arrived after teardown, shutting it down");
            session.shutdown();
            return;
        }
        if let Some(mut previous) = self.session.replace(session) {
            previous.shutdown();
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut (dyn Session + 'static)> {
        self.session.as_deref_mut()
    }

    #[must_use]
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Track a subscription for release on teardown.
    pub fn track(&mut self, mut subscription: Box<dyn Subscription>) {
        if self.disposed {
            subscription.dispose();
            return;
        }
        self.subscriptions.push(subscription);
    }

    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    #[must_use]
    pub const fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Release everything. Returns `true` only on the call that did the work.
    pub fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.disposed = true;

        while let Some(mut subscription) = self.subscriptions.pop() {
            debug!(kind = %subscription.kind(), "Disposing subscription");
            subscription.dispose();
        }

        if let Some(mut session) = self.session.take() {
            debug!("Shutting down session");
            session.shutdown();
        }

        if let Some(dispatcher) = self.dispatcher.take() {
            dispatcher.begin_shutdown();
        }

        info!("Teardown complete");
        true
    }
}

impl<M> Drop for Resources<M> {
    fn drop(&mut self) {
        self.dispose();
    }
}
