use crate::{
    error::ProcessError,
    pool::{Processor, queue::WorkReceiver},
    stats::PoolStats,
    telemetry::{decrement_workers_active, increment_workers_active},
};
use futures::FutureExt;
use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

/// What one worker did before it terminated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker_id: usize,
    /// Events the processor completed successfully.
    pub processed: u64,
    /// Events whose processor returned an error or panicked.
    pub faults: u64,
}

/// Worker task draining the shared work queue.
///
/// Each worker competes with its siblings for the next
/// [`Event`](crate::Event); the queue hands every event to exactly one of
/// them. Processing is sequential: the
/// worker does not receive again until the current event is finished.
///
/// The loop ends only when the queue reports closed-and-empty, which happens
/// after the dispatcher drops the sole sender. Events already in the queue at
/// that point are still processed.
///
/// A processor that fails or panics is logged and counted against the event;
/// the worker moves on to the next one. Nothing is retried.
pub async fn worker_loop<P: Processor>(
    worker_id: usize,
    rx: WorkReceiver,
    processor: Arc<P>,
    stats: Arc<PoolStats>,
) -> WorkerReport {
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} started");
    increment_workers_active();

    let mut report = WorkerReport {
        worker_id,
        ..WorkerReport::default()
    };

    while let Some(event) = rx.recv().await {
        #[cfg(feature = "tracing")]
        tracing::debug!("Worker {worker_id} started {event}");

        let outcome = AssertUnwindSafe(async { processor.process(worker_id, event).await })
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(panic_to_error(payload.as_ref())));

        match outcome {
            Ok(()) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Worker {worker_id} finished {event}");
                report.processed += 1;
                stats.record_processed();
            }
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::error!("Worker {worker_id} failed {event}: {_e}");
                report.faults += 1;
                stats.record_fault();
            }
        }
    }

    decrement_workers_active();
    #[cfg(feature = "tracing")]
    tracing::debug!("Worker {worker_id} stopped, work queue closed");

    report
}

fn panic_to_error(payload: &(dyn Any + Send)) -> ProcessError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    ProcessError::Panicked { message }
}
