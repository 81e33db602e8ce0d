//! Single-threaded cooperative event loop.
//!
//! Every gateway callback and every user action reaches an orchestrator as a
//! message on its [`Dispatcher`]. Messages are handled one at a time, so the
//! orchestrators need no locking. [`DispatcherHandle`] is the only piece that
//! crosses threads: it posts messages and requests shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::gateway::{EventSink, GatewayEvent};

enum Envelope<M> {
    Message(M),
    Shutdown,
}

/// Cloneable, thread-safe handle to a [`Dispatcher`].
pub struct DispatcherHandle<M> {
    tx: mpsc::UnboundedSender<Envelope<M>>,
    shutdown: Arc<AtomicBool>,
}

impl<M> Clone for DispatcherHandle<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}

impl<M> DispatcherHandle<M> {
    /// Queue a message for the loop.
    ///
    /// Returns `false` if shutdown was requested or the loop is gone; the
    /// message is dropped in that case.
    pub fn post(&self, message: M) -> bool {
        if self.is_shut_down() {
            return false;
        }
        self.tx.send(Envelope::Message(message)).is_ok()
    }

    /// Ask the loop to stop after the message it is currently handling.
    ///
    /// Idempotent. Messages still queued are discarded.
    pub fn begin_shutdown(&self) {
        if !self.shutdown.swap(true, Ordering::SeqCst) {
            debug!("Dispatcher shutdown requested");
            let _ = self.tx.send(Envelope::Shutdown);
        }
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

impl<M> DispatcherHandle<M>
where
    M: From<GatewayEvent> + Send + 'static,
{
    /// Sink that delivers gateway callbacks onto this loop.
    pub fn sink(&self) -> EventSink {
        let handle = self.clone();
        EventSink::new(move |event| handle.post(M::from(event)))
    }
}

/// The loop itself. Owned by the thread that runs it.
pub struct Dispatcher<M> {
    rx: mpsc::UnboundedReceiver<Envelope<M>>,
    handle: DispatcherHandle<M>,
}

impl<M> Dispatcher<M> {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            rx,
            handle: DispatcherHandle {
                tx,
                shutdown: Arc::new(AtomicBool::new(false)),
            },
        }
    }

    #[must_use]
    pub fn handle(&self) -> DispatcherHandle<M> {
        self.handle.clone()
    }

    /// Run until shutdown is requested or every handle is dropped.
    ///
    /// Returns the number of messages handled.
    pub async fn run<F>(self, mut handler: F) -> usize
    where
        F: FnMut(M),
    {
        let Self { mut rx, handle } = self;
        let shutdown = Arc::clone(&handle.shutdown);
        // Only external handles keep the loop alive.
        drop(handle);

        let mut handled = 0;
        if shutdown.load(Ordering::SeqCst) {
            return handled;
        }

        while let Some(envelope) = rx.recv().await {
            match envelope {
                Envelope::Message(message) => {
                    handler(message);
                    handled += 1;
                    trace!(handled, "Dispatched message");
                }
                Envelope::Shutdown => break,
            }
            if shutdown.load(Ordering::SeqCst) {
                break;
            }
        }

        debug!(handled, "Dispatcher stopped");
        handled
    }
}

impl<M> Default for Dispatcher<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runs_messages_in_post_order() {
        let dispatcher = Dispatcher::new();
        let handle = dispatcher.handle();
        for i in 1..=3 {
            assert!(handle.post(i));
        }
        drop(handle);

        let mut seen = Vec::new();
        let handled = dispatcher.run(|m: i32| seen.push(m)).await;

        assert_eq!(handled, 3);
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn shutdown_before_run_discards_queue() {
        let dispatcher = Dispatcher::new();
        let handle = dispatcher.handle();
        for i in 0..3 {
            assert!(handle.post(i));
        }
        handle.begin_shutdown();

        let mut seen = Vec::new();
        let handled = dispatcher.run(|m: i32| seen.push(m)).await;

        assert_eq!(handled, 0);
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn handler_can_stop_the_loop() {
        let dispatcher = Dispatcher::new();
        let handle = dispatcher.handle();
        handle.post(1);
        handle.post(2);
        handle.post(3);

        let stopper = handle.clone();
        let mut seen = Vec::new();
        let handled = dispatcher
            .run(|m: i32| {
                seen.push(m);
                if m == 2 {
                    stopper.begin_shutdown();
                }
            })
            .await;

        assert_eq!(handled, 2);
        assert_eq!(seen, vec![1, 2]);
        assert!(!handle.post(4));
    }

    #[tokio::test]
    async fn loop_ends_when_handles_drop() {
        let dispatcher = Dispatcher::new();
        let handle = dispatcher.handle();
        handle.post("a");
        drop(handle);

        let mut seen = Vec::new();
        dispatcher.run(|m| seen.push(m)).await;
        assert_eq!(seen, vec!["a"]);
    }

    #[tokio::test]
    async fn cross_thread_posts_are_delivered() {
        let dispatcher = Dispatcher::new();
        let handle = dispatcher.handle();

        std::thread::spawn(move || {
            handle.post(7u8);
        });

        let mut seen = Vec::new();
        dispatcher.run(|m| seen.push(m)).await;
        assert_eq!(seen, vec![7]);
    }

    #[test]
    fn begin_shutdown_is_idempotent() {
        let dispatcher: Dispatcher<()> = Dispatcher::new();
        let handle = dispatcher.handle();
        handle.begin_shutdown();
        handle.begin_shutdown();
        assert!(handle.is_shut_down());
    }
}
