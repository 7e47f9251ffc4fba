//! Callback bridge between an external event source and the dispatcher.
//!
//! The event source owns its own execution context (a thread, a C library
//! callback, another runtime) and only knows how to call a function with a new
//! [`Event`]. [`IngestRelay`] turns that call into a send on a bounded channel
//! so the source never touches the work queue directly.
//!
//! Under [`OverflowPolicy::Block`] a full ingest buffer back-pressures the
//! source: `submit` waits until the dispatcher frees a slot. The source cadence
//! is expected to be slower than the buffer drains in steady state, so this
//! wait is short. Sources that must never wait should use
//! [`OverflowPolicy::Reject`] or [`IngestRelay::try_submit`] and handle
//! [`SubmitError::Overflow`].

use crate::{config::OverflowPolicy, error::SubmitError, event::Event, stats::PoolStats};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Anything that accepts events from a source.
///
/// This is the single injection point a callback-driven source needs. It must
/// be safe to call concurrently with the pipeline's own tasks.
pub trait EventSink: Send + Sync {
    /// Hands `event` to the sink.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError`] carrying the event when it was not accepted.
    fn submit(&self, event: Event) -> Result<(), SubmitError>;
}

/// Cloneable handle the event source uses to submit events.
#[derive(Clone, Debug)]
pub struct IngestRelay {
    tx: mpsc::Sender<Event>,
    policy: OverflowPolicy,
    stats: Arc<PoolStats>,
}

impl IngestRelay {
    pub(crate) fn channel(
        capacity: usize,
        policy: OverflowPolicy,
        stats: Arc<PoolStats>,
    ) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx, policy, stats }, rx)
    }

    /// Returns `true` once the dispatcher stopped accepting events.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Submits `event` from a synchronous context.
    ///
    /// # Errors
    ///
    /// - [`SubmitError::Overflow`] if the buffer is full under
    ///   [`OverflowPolicy::Reject`].
    /// - [`SubmitError::Closed`] if the pipeline is shutting down.
    ///
    /// # Panics
    ///
    /// Under [`OverflowPolicy::Block`] this blocks the current thread and
    /// panics when called from within an asynchronous execution context. Use
    /// [`IngestRelay::submit_async`] from async code.
    pub fn submit(&self, event: Event) -> Result<(), SubmitError> {
        match self.policy {
            OverflowPolicy::Block => {
                self.tx
                    .blocking_send(event)
                    .map_err(|e| SubmitError::Closed(e.0))?;
                self.stats.record_submitted();
                Ok(())
            }
            OverflowPolicy::Reject => self.try_submit(event),
        }
    }

    /// Submits `event` from async code, honoring the relay's
    /// [`OverflowPolicy`].
    ///
    /// # Errors
    ///
    /// Same as [`IngestRelay::submit`].
    pub async fn submit_async(&self, event: Event) -> Result<(), SubmitError> {
        match self.policy {
            OverflowPolicy::Block => {
                self.tx
                    .send(event)
                    .await
                    .map_err(|e| SubmitError::Closed(e.0))?;
                self.stats.record_submitted();
                Ok(())
            }
            OverflowPolicy::Reject => self.try_submit(event),
        }
    }

    /// Submits `event` without ever waiting, regardless of policy.
    ///
    /// # Errors
    ///
    /// - [`SubmitError::Overflow`] if the ingest buffer is full.
    /// - [`SubmitError::Closed`] if the pipeline is shutting down.
    pub fn try_submit(&self, event: Event) -> Result<(), SubmitError> {
        match self.tx.try_send(event) {
            Ok(()) => {
                self.stats.record_submitted();
                Ok(())
            }
            Err(TrySendError::Full(event)) => Err(SubmitError::Overflow(event)),
            Err(TrySendError::Closed(event)) => Err(SubmitError::Closed(event)),
        }
    }

    /// Wraps the relay in a plain callback for sources that only accept a
    /// `Fn(u64)`-style registration.
    ///
    /// Rejections are logged and otherwise swallowed; the source has no way
    /// to act on them.
    pub fn callback(&self) -> impl Fn(Event) + Send + Sync + 'static {
        let relay = self.clone();
        move |event| {
            if let Err(_e) = relay.submit(event) {
                #[cfg(feature = "tracing")]
                match _e {
                    SubmitError::Overflow(_) => tracing::warn!("{_e}"),
                    SubmitError::Closed(_) => tracing::debug!("{_e}"),
                };
            }
        }
    }
}

impl EventSink for IngestRelay {
    fn submit(&self, event: Event) -> Result<(), SubmitError> {
        IngestRelay::submit(self, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;

    fn relay(policy: OverflowPolicy) -> (IngestRelay, mpsc::Receiver<Event>, Arc<PoolStats>) {
        let stats = Arc::new(PoolStats::default());
        let (relay, rx) = IngestRelay::channel(1, policy, stats.clone());
        (relay, rx, stats)
    }

    #[tokio::test]
    async fn reject_reports_overflow_when_full() {
        let (relay, mut rx, stats) = relay(OverflowPolicy::Reject);

        relay.submit(Event::new(0)).unwrap();
        assert_eq!(
            relay.submit(Event::new(1)),
            Err(SubmitError::Overflow(Event::new(1)))
        );
        assert_eq!(stats.snapshot().submitted, 1);

        assert_eq!(rx.recv().await, Some(Event::new(0)));
        relay.submit(Event::new(2)).unwrap();
        assert_eq!(rx.recv().await, Some(Event::new(2)));
    }

    #[tokio::test]
    async fn try_submit_never_waits_under_block_policy() {
        let (relay, _rx, _) = relay(OverflowPolicy::Block);

        relay.try_submit(Event::new(0)).unwrap();
        assert_eq!(
            relay.try_submit(Event::new(1)),
            Err(SubmitError::Overflow(Event::new(1)))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn block_waits_until_dispatcher_drains() {
        let (relay, mut rx, stats) = relay(OverflowPolicy::Block);

        let source = tokio::task::spawn_blocking(move || {
            relay.submit(Event::new(0)).unwrap();
            relay.submit(Event::new(1)).unwrap();
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!source.is_finished(), "second submit should be blocked");
        assert_eq!(stats.snapshot().submitted, 1);

        assert_eq!(rx.recv().await, Some(Event::new(0)));
        source.await.unwrap();
        assert_eq!(rx.recv().await, Some(Event::new(1)));
        assert_eq!(stats.snapshot().submitted, 2);
    }

    #[tokio::test]
    async fn submit_after_close_is_rejected() {
        let (relay, mut rx, _) = relay(OverflowPolicy::Block);
        rx.close();

        assert!(relay.is_closed());
        assert_eq!(
            relay.submit_async(Event::new(7)).await,
            Err(SubmitError::Closed(Event::new(7)))
        );
        assert_eq!(
            relay.try_submit(Event::new(8)),
            Err(SubmitError::Closed(Event::new(8)))
        );
    }

    #[tokio::test]
    async fn callback_swallows_rejections() {
        let (relay, mut rx, _) = relay(OverflowPolicy::Reject);
        let callback = relay.callback();

        callback(Event::new(0));
        callback(Event::new(1));

        assert_eq!(rx.recv().await, Some(Event::new(0)));
        assert!(rx.try_recv().is_err());
    }
}
