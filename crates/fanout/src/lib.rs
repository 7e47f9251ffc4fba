//! # `fanout`: bounded relay into a fixed worker pool
//!
//! `fanout` bridges a callback-driven event source into a pool of Tokio
//! workers and shuts the whole thing down without losing track of any work.
//!
//! ```text
//! source ──submit──▶ ingest buffer ──▶ dispatcher ──▶ work queue ──▶ N workers
//!                                         ▲
//!                          cancellation ──┘   (closes the work queue)
//! ```
//!
//! ## Highlights
//!
//! - **Callback bridge**: [`IngestRelay::submit`] can be called from any
//!   thread; a full buffer either blocks the source or reports
//!   [`SubmitError::Overflow`] depending on [`OverflowPolicy`].
//! - **Single dispatcher**: events keep their submission order into the work
//!   queue, and the dispatcher is the only task that can close it.
//! - **Competing workers**: every event goes to exactly one worker; processor
//!   failures and panics are captured per event.
//! - **Graceful shutdown**: cancellation closes the work queue, workers finish
//!   what is queued, and [`ShutdownCoordinator::await_drain`] returns once the
//!   last one exits (optionally bounded by a drain timeout).
//!
//! ## Usage
//!
//! ```no_run
//! use fanout::{Event, Pipeline, PipelineConfig, ProcessError};
//!
//! # async fn run() -> fanout::Result<()> {
//! let processor = |worker: usize, event: Event| async move {
//!     println!("worker {worker} handled {event}");
//!     Ok::<(), ProcessError>(())
//! };
//! let pipeline = Pipeline::start(PipelineConfig::with_workers(4), processor)?;
//!
//! let relay = pipeline.relay();
//! relay.submit_async(Event::new(1)).await.ok();
//!
//! let report = pipeline.shutdown().await;
//! assert!(report.is_clean());
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`relay`] - Callback bridge into the ingest buffer.
//! - [`dispatch`] - The ingest → work queue loop.
//! - [`pool`] - Worker tasks and the [`Processor`] trait.
//! - [`shutdown`] - Cancellation token and completion barrier.
//! - [`telemetry`] - Optional OpenTelemetry metric handles.

mod config;
pub mod dispatch;
mod error;
mod event;
mod pipeline;
pub mod pool;
pub mod relay;
pub mod shutdown;
mod stats;
pub mod telemetry;

pub use config::{OverflowPolicy, PipelineConfig, ShutdownPolicy};
pub use dispatch::{DispatchReport, Dispatcher, StopReason};
pub use error::{Error, ProcessError, Result, SubmitError};
pub use event::Event;
pub use pipeline::{Pipeline, ShutdownReport};
pub use pool::{Processor, manager::WorkerPool, worker::WorkerReport};
pub use relay::{EventSink, IngestRelay};
pub use shutdown::{DrainOutcome, ShutdownCoordinator};
pub use stats::{PoolStats, StatsSnapshot};
