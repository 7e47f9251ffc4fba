//! The single coordination loop between the ingest buffer and the work queue.
//!
//! [`Dispatcher`] is the only task that reads the ingest buffer and the only
//! owner of the work queue's sender. Dropping that sender is how workers learn
//! the pipeline is shutting down; there is no separate signal delivered to
//! them.

use crate::{
    config::ShutdownPolicy,
    event::Event,
    pool::queue::WorkSender,
    stats::PoolStats,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Why the dispatch loop ended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StopReason {
    /// The cancellation token was raised.
    #[default]
    Cancelled,
    /// Every [`IngestRelay`](crate::IngestRelay) handle was dropped and the
    /// buffer was empty.
    SourceClosed,
    /// Every worker went away while an event was waiting to be queued.
    WorkersGone,
}

/// Summary returned by [`Dispatcher::run`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Events placed in the work queue.
    pub forwarded: u64,
    /// Events discarded at shutdown: those left in the ingest buffer plus one
    /// held while waiting for queue capacity.
    pub dropped: u64,
    pub reason: StopReason,
}

pub struct Dispatcher {
    ingest_rx: mpsc::Receiver<Event>,
    work_tx: WorkSender,
    shutdown_token: CancellationToken,
    policy: ShutdownPolicy,
    stats: Arc<PoolStats>,
}

impl Dispatcher {
    pub const fn new(
        ingest_rx: mpsc::Receiver<Event>,
        work_tx: WorkSender,
        shutdown_token: CancellationToken,
        policy: ShutdownPolicy,
        stats: Arc<PoolStats>,
    ) -> Self {
        Self {
            ingest_rx,
            work_tx,
            shutdown_token,
            policy,
            stats,
        }
    }

    /// Moves events from the ingest buffer to the work queue until cancelled.
    ///
    /// Receiving an event and observing cancellation race with no priority:
    /// when both are ready either may win. The same holds while a received
    /// event waits for work queue capacity; if cancellation wins there, the
    /// held event is treated like the ones still in the ingest buffer.
    ///
    /// On cancellation the ingest buffer is closed to new submissions first,
    /// then the held and pending events are either discarded or forwarded
    /// according to the [`ShutdownPolicy`]. The work queue is closed exactly
    /// once, when this function returns.
    pub async fn run(self) -> DispatchReport {
        let Self {
            mut ingest_rx,
            work_tx,
            shutdown_token,
            policy,
            stats,
        } = self;

        #[cfg(feature = "tracing")]
        tracing::debug!("Dispatcher started");

        let mut report = DispatchReport::default();
        let mut held = None;

        report.reason = loop {
            tokio::select! {
                () = shutdown_token.cancelled() => break StopReason::Cancelled,
                received = ingest_rx.recv() => {
                    let Some(event) = received else {
                        break StopReason::SourceClosed;
                    };
                    // `send` is cancel-safe: losing this race leaves the event
                    // unqueued and still ours.
                    tokio::select! {
                        () = shutdown_token.cancelled() => {
                            held = Some(event);
                            break StopReason::Cancelled;
                        }
                        sent = work_tx.send(event) => {
                            if sent.is_err() {
                                report.dropped += 1;
                                stats.record_dropped(1);
                                break StopReason::WorkersGone;
                            }
                            report.forwarded += 1;
                            stats.record_forwarded();
                        }
                    }
                }
            }
        };

        if report.reason == StopReason::Cancelled {
            #[cfg(feature = "tracing")]
            tracing::info!("Dispatcher received cancellation signal");

            // Wakes any source blocked on a full buffer with `Closed`.
            ingest_rx.close();

            match policy {
                ShutdownPolicy::DropPending => {
                    let mut dropped = u64::from(held.is_some());
                    while ingest_rx.recv().await.is_some() {
                        dropped += 1;
                    }
                    if dropped > 0 {
                        #[cfg(feature = "tracing")]
                        tracing::warn!("Dropped {dropped} pending events at shutdown");
                        stats.record_dropped(dropped);
                    }
                    report.dropped += dropped;
                }
                ShutdownPolicy::DrainPending => {
                    let mut pending = held;
                    loop {
                        let event = match pending.take() {
                            Some(event) => event,
                            None => match ingest_rx.recv().await {
                                Some(event) => event,
                                None => break,
                            },
                        };
                        if work_tx.send(event).await.is_err() {
                            report.dropped += 1;
                            stats.record_dropped(1);
                            continue;
                        }
                        report.forwarded += 1;
                        stats.record_forwarded();
                    }
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Ingest buffer drained into work queue");
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Closing work queue ({:?}, forwarded {}, dropped {})",
            report.reason,
            report.forwarded,
            report.dropped
        );
        drop(work_tx);

        report
    }
}
