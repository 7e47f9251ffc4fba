//! Cancellation and the completion barrier.
//!
//! [`ShutdownCoordinator`] owns the two shutdown primitives:
//!
//! - a [`CancellationToken`] observed by the dispatcher; raising it is the
//!   only way to start a graceful shutdown, and
//! - a [`TaskTracker`] every worker is spawned on; it is the barrier
//!   [`ShutdownCoordinator::await_drain`] waits on.
//!
//! Both operations are idempotent and safe under concurrent signal delivery.

use core::time::Duration;
use portable_atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::timeout;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

/// How [`ShutdownCoordinator::await_drain`] ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every worker terminated.
    Completed,
    /// The drain timeout elapsed with `remaining` workers still running.
    ForcedTermination { remaining: usize },
}

impl DrainOutcome {
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

#[derive(Clone, Debug)]
pub struct ShutdownCoordinator {
    shutdown_token: CancellationToken,
    tracker: TaskTracker,
    initiated: Arc<AtomicBool>,
    drain_timeout: Option<Duration>,
}

impl ShutdownCoordinator {
    pub fn new(drain_timeout: Option<Duration>) -> Self {
        Self {
            shutdown_token: CancellationToken::new(),
            tracker: TaskTracker::new(),
            initiated: Arc::new(AtomicBool::new(false)),
            drain_timeout,
        }
    }

    /// Token the dispatcher observes.
    pub fn token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Barrier the workers are spawned on.
    pub const fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }

    /// Raises the cancellation signal.
    ///
    /// Returns `true` for the call that actually raised it. Every later or
    /// concurrent call is a no-op returning `false`.
    pub fn initiate(&self) -> bool {
        if self.initiated.swap(true, Ordering::AcqRel) {
            #[cfg(feature = "tracing")]
            tracing::trace!("Shutdown already initiated");
            return false;
        }

        #[cfg(feature = "tracing")]
        tracing::info!("Shutdown initiated, cancelling dispatcher");
        self.shutdown_token.cancel();
        true
    }

    pub fn is_initiated(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Waits until every tracked worker has terminated.
    ///
    /// Returns immediately when no worker is running. With a drain timeout
    /// configured, gives up after that long and reports
    /// [`DrainOutcome::ForcedTermination`]; the workers are not stopped by
    /// this call.
    ///
    /// May be called more than once.
    pub async fn await_drain(&self) -> DrainOutcome {
        self.tracker.close();

        #[cfg(feature = "tracing")]
        tracing::debug!("Waiting for {} workers to drain", self.tracker.len());

        let Some(limit) = self.drain_timeout else {
            self.tracker.wait().await;
            #[cfg(feature = "tracing")]
            tracing::info!("All workers drained");
            return DrainOutcome::Completed;
        };

        match timeout(limit, self.tracker.wait()).await {
            Ok(()) => {
                #[cfg(feature = "tracing")]
                tracing::info!("All workers drained");
                DrainOutcome::Completed
            }
            Err(_) => {
                let remaining = self.tracker.len();
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    "Drain timed out after {:?} ({remaining} workers still running)",
                    limit
                );
                DrainOutcome::ForcedTermination { remaining }
            }
        }
    }
}
