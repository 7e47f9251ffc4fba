use portable_atomic::{AtomicU64, Ordering};

/// Running counters shared by the relay, the dispatcher and the workers.
///
/// Counters only ever increase. Relaxed ordering is enough: readers want a
/// point-in-time view, not a synchronization edge.
#[derive(Debug, Default)]
pub struct PoolStats {
    submitted: AtomicU64,
    forwarded: AtomicU64,
    dropped: AtomicU64,
    processed: AtomicU64,
    faults: AtomicU64,
}

/// A copy of [`PoolStats`] at one instant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Events accepted into the ingest buffer.
    pub submitted: u64,
    /// Events the dispatcher placed in the work queue.
    pub forwarded: u64,
    /// Events discarded from the ingest buffer at shutdown.
    pub dropped: u64,
    /// Events a worker finished successfully.
    pub processed: u64,
    /// Events whose processor returned an error or panicked.
    pub faults: u64,
}

impl PoolStats {
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
        crate::telemetry::increment_events_submitted();
    }

    pub(crate) fn record_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
        crate::telemetry::increment_events_forwarded();
    }

    pub(crate) fn record_dropped(&self, count: u64) {
        self.dropped.fetch_add(count, Ordering::Relaxed);
        crate::telemetry::increment_events_dropped(count);
    }

    pub(crate) fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        crate::telemetry::increment_events_processed();
    }

    pub(crate) fn record_fault(&self) {
        self.faults.fetch_add(1, Ordering::Relaxed);
        crate::telemetry::increment_processing_faults();
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            faults: self.faults.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    /// Events that reached the work queue but have not finished yet.
    pub const fn in_flight(&self) -> u64 {
        self.forwarded
            .saturating_sub(self.processed)
            .saturating_sub(self.faults)
    }
}
