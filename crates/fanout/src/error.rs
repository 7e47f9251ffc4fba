//! Error types for the relay and worker pool.
//!
//! This module defines the error enums surfaced by the pipeline. None of them
//! are fatal to the core: submissions report [`SubmitError`] back to the event
//! source, processors report [`ProcessError`] which the worker logs and counts,
//! and [`Error`] is only produced while building a pipeline.
//!
//! ## Error Cases
//! - `InvalidConfig`: A [`PipelineConfig`] value failed validation.
//! - `Overflow`: The ingest buffer was full under a non-blocking submit.
//! - `Closed`: The pipeline is shutting down and no longer accepts events.
//!
//! [`PipelineConfig`]: crate::PipelineConfig

use crate::event::Event;

pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised while constructing a pipeline.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// A configuration value was out of range.
    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },
}

/// Returned to the event source when an [`Event`] was not accepted.
///
/// The rejected event is handed back so the caller may decide what to do with
/// it.
#[derive(Clone, Copy, thiserror::Error, Debug, PartialEq, Eq)]
pub enum SubmitError {
    /// The ingest buffer was full and the submit was non-blocking.
    #[error("Ingest buffer full, rejected {0}")]
    Overflow(Event),

    /// The pipeline has begun shutting down.
    #[error("Pipeline closed, rejected {0}")]
    Closed(Event),
}

impl SubmitError {
    /// The event that was not accepted.
    pub const fn event(&self) -> Event {
        match self {
            Self::Overflow(event) | Self::Closed(event) => *event,
        }
    }
}

/// A failure reported by a [`Processor`](crate::Processor) for one event.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum ProcessError {
    /// The processor returned an error.
    #[error("Processing failed: {reason}")]
    Failed { reason: String },

    /// The processor panicked. The payload is captured when it is a string.
    #[error("Processor panicked: {message}")]
    Panicked { message: String },
}

impl ProcessError {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}
