//! Spawning and joining the worker tasks.
//!
//! This module defines the [`WorkerPool`] struct, which starts a fixed number
//! of workers that all receive from one bounded multi-consumer queue. Each
//! worker is spawned through the shared [`TaskTracker`] so the shutdown
//! coordinator can wait on all of them as a single barrier.
//!
//! The pool holds no sender for the queue. Closing the queue is the
//! dispatcher's job, and it is the only signal workers observe.

use crate::{
    pool::{
        Processor,
        queue::WorkReceiver,
        worker::{WorkerReport, worker_loop},
    },
    stats::PoolStats,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

/// A fixed set of worker tasks draining one work queue.
pub struct WorkerPool {
    workers: Vec<JoinHandle<WorkerReport>>,
}

impl WorkerPool {
    /// Spawns `num_workers` workers on the current runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn spawn<P: Processor>(
        num_workers: usize,
        work_rx: &WorkReceiver,
        processor: Arc<P>,
        tracker: &TaskTracker,
        stats: &Arc<PoolStats>,
    ) -> Self {
        let workers = (0..num_workers)
            .map(|worker_id| {
                tracker.spawn(worker_loop(
                    worker_id,
                    work_rx.clone(),
                    processor.clone(),
                    stats.clone(),
                ))
            })
            .collect();

        #[cfg(feature = "tracing")]
        tracing::debug!("Spawned {num_workers} workers");

        Self { workers }
    }

    /// Waits for every worker and returns their reports in index order.
    ///
    /// A worker that did not return a report (it was aborted) is logged and
    /// left out.
    pub async fn join(self) -> Vec<WorkerReport> {
        futures::future::join_all(self.workers)
            .await
            .into_iter()
            .filter_map(|res| match res {
                Ok(report) => Some(report),
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Worker task did not complete: {_e}");
                    None
                }
            })
            .collect()
    }

    /// Abandons the workers still running. Their current event is lost.
    pub fn abort(&self) {
        for worker in &self.workers {
            worker.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ProcessError, event::Event, pool::queue};
    use std::{collections::HashSet, sync::Mutex};

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn every_event_goes_to_exactly_one_worker() {
        const EVENTS: u64 = 200;

        let (tx, rx) = queue::bounded(4);
        let tracker = TaskTracker::new();
        let stats = Arc::new(PoolStats::default());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let record = seen.clone();
        let processor = Arc::new(move |worker_id: usize, event: Event| {
            let record = record.clone();
            async move {
                tokio::task::yield_now().await;
                record.lock().unwrap().push((worker_id, event));
                Ok::<(), ProcessError>(())
            }
        });

        let pool = WorkerPool::spawn(4, &rx, processor, &tracker, &stats);
        drop(rx);

        for i in 0..EVENTS {
            tx.send(Event::new(i)).await.unwrap();
        }
        drop(tx);

        tracker.close();
        tracker.wait().await;
        let reports = pool.join().await;

        assert_eq!(reports.len(), 4);
        assert_eq!(reports.iter().map(|r| r.processed).sum::<u64>(), EVENTS);

        let seen = seen.lock().unwrap();
        let unique: HashSet<_> = seen.iter().map(|(_, event)| *event).collect();
        assert_eq!(seen.len() as u64, EVENTS);
        assert_eq!(unique.len() as u64, EVENTS);
    }

    #[tokio::test]
    async fn aborted_workers_are_left_out_of_reports() {
        let (_tx, rx) = queue::bounded(1);
        let tracker = TaskTracker::new();
        let stats = Arc::new(PoolStats::default());
        let processor = Arc::new(|_: usize, _: Event| async { Ok::<(), ProcessError>(()) });

        let pool = WorkerPool::spawn(2, &rx, processor, &tracker, &stats);
        pool.abort();

        assert!(pool.join().await.is_empty());
    }
}
