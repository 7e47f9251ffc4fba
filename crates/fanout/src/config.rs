use crate::error::{Error, Result};
use core::time::Duration;

/// What [`IngestRelay::submit`](crate::IngestRelay::submit) does when the
/// ingest buffer is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Block the caller until the dispatcher frees a slot.
    #[default]
    Block,
    /// Return [`SubmitError::Overflow`](crate::SubmitError::Overflow)
    /// immediately.
    Reject,
}

/// What the dispatcher does with events still sitting in the ingest buffer
/// when cancellation is observed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShutdownPolicy {
    /// Discard them and report the count as dropped.
    #[default]
    DropPending,
    /// Forward them to the work queue before closing it.
    DrainPending,
}

/// Runtime configuration for a [`Pipeline`](crate::Pipeline).
///
/// Every size is a construction parameter; nothing is fixed at compile time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Number of worker tasks draining the work queue.
    pub num_workers: usize,
    /// Capacity of the buffer between the event source and the dispatcher.
    pub ingest_capacity: usize,
    /// Capacity of the work queue. Defaults to `num_workers` when `None`.
    pub queue_capacity: Option<usize>,
    pub overflow_policy: OverflowPolicy,
    pub shutdown_policy: ShutdownPolicy,
    /// Upper bound on [`Pipeline::await_drain`](crate::Pipeline::await_drain).
    /// `None` waits for every worker indefinitely.
    pub drain_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            num_workers: 4,
            ingest_capacity: 1,
            queue_capacity: None,
            overflow_policy: OverflowPolicy::default(),
            shutdown_policy: ShutdownPolicy::default(),
            drain_timeout: None,
        }
    }
}

impl PipelineConfig {
    pub fn with_workers(num_workers: usize) -> Self {
        Self {
            num_workers,
            ..Self::default()
        }
    }

    /// Effective work queue capacity.
    pub fn work_queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(self.num_workers)
    }

    /// Checks every size is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the pool is empty or a buffer has
    /// zero capacity.
    pub fn validate(&self) -> Result<()> {
        if self.num_workers == 0 {
            return Err(Error::InvalidConfig {
                reason: "num_workers must be greater than 0".to_string(),
            });
        }

        if self.ingest_capacity == 0 {
            return Err(Error::InvalidConfig {
                reason: "ingest_capacity must be greater than 0".to_string(),
            });
        }

        if self.work_queue_capacity() == 0 {
            return Err(Error::InvalidConfig {
                reason: "queue_capacity must be greater than 0".to_string(),
            });
        }

        if self.drain_timeout == Some(Duration::ZERO) {
            return Err(Error::InvalidConfig {
                reason: "drain_timeout must be non-zero when set".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.work_queue_capacity(), 4);
    }

    #[test]
    fn queue_capacity_overrides_worker_count() {
        let config = PipelineConfig {
            queue_capacity: Some(16),
            ..PipelineConfig::with_workers(2)
        };
        assert_eq!(config.work_queue_capacity(), 16);
    }

    #[test]
    fn rejects_zero_sizes() {
        assert!(matches!(
            PipelineConfig::with_workers(0).validate(),
            Err(Error::InvalidConfig { .. })
        ));

        let config = PipelineConfig {
            ingest_capacity: 0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            queue_capacity: Some(0),
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            drain_timeout: Some(Duration::ZERO),
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
