//! Fixed-size worker pool fed by a shared, bounded work queue.
//!
//! ## Structure
//!
//! - [`manager`] - Spawns the workers onto the completion barrier and collects
//!   their reports.
//! - [`queue`] - The bounded work queue and its cancel-safe sender.
//! - [`worker`] - The per-worker receive/process loop.

pub mod manager;
pub mod queue;
pub mod worker;

use crate::{error::ProcessError, event::Event};
use core::future::Future;

/// User work applied to each [`Event`].
///
/// Implementations receive the index of the worker running them. Returning
/// `Err` (or panicking) marks the event as a fault; the worker keeps going.
///
/// Any `Fn(usize, Event) -> impl Future<Output = Result<(), ProcessError>>`
/// closure is a `Processor`.
pub trait Processor: Send + Sync + 'static {
    fn process(
        &self,
        worker_id: usize,
        event: Event,
    ) -> impl Future<Output = Result<(), ProcessError>> + Send;
}

impl<F, Fut> Processor for F
where
    F: Fn(usize, Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ProcessError>> + Send,
{
    fn process(
        &self,
        worker_id: usize,
        event: Event,
    ) -> impl Future<Output = Result<(), ProcessError>> + Send {
        self(worker_id, event)
    }
}
