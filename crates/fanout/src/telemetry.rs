//! Optional OpenTelemetry metric handles.
//!
//! With the `metrics` feature enabled the binary installs a meter provider and
//! calls [`init_metric_handles`]; the pipeline then records into the
//! instruments below. Without the feature every recording function compiles to
//! a no-op.

#[cfg(feature = "metrics")]
use opentelemetry::metrics::{Counter, Meter, UpDownCounter};
#[cfg(feature = "metrics")]
use std::sync::OnceLock;

#[cfg(feature = "metrics")]
static EVENTS_SUBMITTED: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static EVENTS_FORWARDED: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static EVENTS_DROPPED: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static EVENTS_PROCESSED: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static PROCESSING_FAULTS: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static WORKERS_ACTIVE: OnceLock<UpDownCounter<i64>> = OnceLock::new();

/// Registers the pipeline's instruments on `meter`. Subsequent calls are
/// ignored.
#[cfg(feature = "metrics")]
pub fn init_metric_handles(meter: &Meter) {
    let _ = EVENTS_SUBMITTED.set(
        meter
            .u64_counter("events_submitted")
            .with_description("Events accepted into the ingest buffer")
            .build(),
    );

    let _ = EVENTS_FORWARDED.set(
        meter
            .u64_counter("events_forwarded")
            .with_description("Events moved into the work queue")
            .build(),
    );

    let _ = EVENTS_DROPPED.set(
        meter
            .u64_counter("events_dropped")
            .with_description("Events discarded from the ingest buffer at shutdown")
            .build(),
    );

    let _ = EVENTS_PROCESSED.set(
        meter
            .u64_counter("events_processed")
            .with_description("Events processed successfully")
            .build(),
    );

    let _ = PROCESSING_FAULTS.set(
        meter
            .u64_counter("processing_faults")
            .with_description("Events whose processor failed or panicked")
            .build(),
    );

    let _ = WORKERS_ACTIVE.set(
        meter
            .i64_up_down_counter("workers_active")
            .with_description("Worker tasks that have not terminated")
            .build(),
    );
}

#[cfg(feature = "metrics")]
pub fn increment_events_submitted() {
    if let Some(counter) = EVENTS_SUBMITTED.get() {
        counter.add(1, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_events_submitted() {}

#[cfg(feature = "metrics")]
pub fn increment_events_forwarded() {
    if let Some(counter) = EVENTS_FORWARDED.get() {
        counter.add(1, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_events_forwarded() {}

#[cfg(feature = "metrics")]
pub fn increment_events_dropped(count: u64) {
    if let Some(counter) = EVENTS_DROPPED.get() {
        counter.add(count, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_events_dropped(_count: u64) {}

#[cfg(feature = "metrics")]
pub fn increment_events_processed() {
    if let Some(counter) = EVENTS_PROCESSED.get() {
        counter.add(1, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_events_processed() {}

#[cfg(feature = "metrics")]
pub fn increment_processing_faults() {
    if let Some(counter) = PROCESSING_FAULTS.get() {
        counter.add(1, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_processing_faults() {}

#[cfg(feature = "metrics")]
pub fn increment_workers_active() {
    if let Some(counter) = WORKERS_ACTIVE.get() {
        counter.add(1, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_workers_active() {}

#[cfg(feature = "metrics")]
pub fn decrement_workers_active() {
    if let Some(counter) = WORKERS_ACTIVE.get() {
        counter.add(-1, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn decrement_workers_active() {}
