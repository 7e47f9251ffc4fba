use crate::{
    config::PipelineConfig,
    dispatch::{DispatchReport, Dispatcher},
    error::Result,
    pool::{Processor, manager::WorkerPool, queue, worker::WorkerReport},
    relay::IngestRelay,
    shutdown::{DrainOutcome, ShutdownCoordinator},
    stats::{PoolStats, StatsSnapshot},
};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Everything known about a completed shutdown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShutdownReport {
    /// `None` when the drain was forced and the dispatcher was abandoned.
    pub dispatch: Option<DispatchReport>,
    pub drain: DrainOutcome,
    pub workers: Vec<WorkerReport>,
    pub stats: StatsSnapshot,
}

impl ShutdownReport {
    /// `true` when every worker terminated on its own.
    pub const fn is_clean(&self) -> bool {
        self.drain.is_completed()
    }
}

/// A running relay → dispatcher → worker pool pipeline.
///
/// Created with [`Pipeline::start`]. Events enter through [`Pipeline::relay`];
/// [`Pipeline::shutdown`] cancels the dispatcher, waits for the workers and
/// reports what happened.
pub struct Pipeline {
    relay: IngestRelay,
    coordinator: ShutdownCoordinator,
    dispatcher: JoinHandle<DispatchReport>,
    workers: WorkerPool,
    stats: Arc<PoolStats>,
}

impl Pipeline {
    /// Validates `config`, then spawns the dispatcher and the worker pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) if the
    /// configuration is unusable.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn start<P: Processor>(config: PipelineConfig, processor: P) -> Result<Self> {
        config.validate()?;

        let stats = Arc::new(PoolStats::default());
        let coordinator = ShutdownCoordinator::new(config.drain_timeout);

        let (relay, ingest_rx) =
            IngestRelay::channel(config.ingest_capacity, config.overflow_policy, stats.clone());
        let (work_tx, work_rx) = queue::bounded(config.work_queue_capacity());

        let workers = WorkerPool::spawn(
            config.num_workers,
            &work_rx,
            Arc::new(processor),
            coordinator.tracker(),
            &stats,
        );
        // Only workers hold receivers; the queue reports closed-and-empty
        // exactly when the dispatcher drops `work_tx`.
        drop(work_rx);

        let dispatcher = tokio::spawn(
            Dispatcher::new(
                ingest_rx,
                work_tx,
                coordinator.token(),
                config.shutdown_policy,
                stats.clone(),
            )
            .run(),
        );

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Pipeline started with {} workers (ingest capacity {}, queue capacity {})",
            config.num_workers,
            config.ingest_capacity,
            config.work_queue_capacity()
        );

        Ok(Self {
            relay,
            coordinator,
            dispatcher,
            workers,
            stats,
        })
    }

    /// A handle for the event source.
    ///
    /// The pipeline keeps a handle of its own, so dropping every returned
    /// clone does not close the ingest buffer: the dispatcher runs until
    /// [`Pipeline::initiate`] or [`Pipeline::shutdown`]. A
    /// [`Dispatcher`](crate::Dispatcher) driven directly stops with
    /// [`StopReason::SourceClosed`](crate::StopReason::SourceClosed) instead.
    pub fn relay(&self) -> IngestRelay {
        self.relay.clone()
    }

    /// A handle that can start shutdown from elsewhere, e.g. a signal task.
    pub fn coordinator(&self) -> ShutdownCoordinator {
        self.coordinator.clone()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Raises the cancellation signal. Idempotent.
    pub fn initiate(&self) -> bool {
        self.coordinator.initiate()
    }

    /// Waits for every worker to terminate, bounded by the configured drain
    /// timeout.
    pub async fn await_drain(&self) -> DrainOutcome {
        self.coordinator.await_drain().await
    }

    /// Cancels the dispatcher, waits for the pool to drain and collects the
    /// reports.
    ///
    /// If the drain is forced, the dispatcher and remaining workers are
    /// aborted so the caller can exit.
    pub async fn shutdown(self) -> ShutdownReport {
        self.coordinator.initiate();
        let drain = self.coordinator.await_drain().await;

        let dispatch = if drain.is_completed() {
            match self.dispatcher.await {
                Ok(report) => Some(report),
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Dispatcher task did not complete: {_e}");
                    None
                }
            }
        } else {
            #[cfg(feature = "tracing")]
            tracing::warn!("Forcing termination of dispatcher and remaining workers");
            self.dispatcher.abort();
            self.workers.abort();
            None
        };

        let workers = self.workers.join().await;
        let stats = self.stats.snapshot();

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Pipeline shut down: processed {}, faults {}, dropped {}",
            stats.processed,
            stats.faults,
            stats.dropped
        );

        ShutdownReport {
            dispatch,
            drain,
            workers,
            stats,
        }
    }
}
