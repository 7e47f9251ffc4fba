//! Runs a [`fanout`] pipeline against a simulated callback source.
//!
//! The source emits one event per `EVENT_INTERVAL_MS` on its own thread; each
//! worker "processes" an event by sleeping for a random duration. On SIGINT or
//! SIGTERM the dispatcher is cancelled, the workers drain the work queue, and
//! the process exits once the last worker is done.

mod config;
mod producer;
mod telemetry;
mod work;

use anyhow::bail;
use clap::Parser;
use config::{CliArgs, ServerConfig};
use fanout::{DrainOutcome, Pipeline, ShutdownCoordinator};
use producer::Producer;
use std::sync::Arc;
use telemetry::init_telemetry;
use tokio::signal;
use work::SimulatedWork;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry()?;
    log_startup_info(&config);

    let work = SimulatedWork::new(config.work_min, config.work_max);
    let pipeline = Pipeline::start(config.pipeline.clone(), work)?;

    // Simulate an external lib sending us events at a fixed cadence.
    let source = Producer::new(Arc::new(pipeline.relay()), config.event_interval).start()?;

    shutdown_signal(pipeline.coordinator()).await;

    let report = pipeline.shutdown().await;

    // The source notices the closed relay on its next submit. If the drain was
    // forced it may still be sleeping; don't wait for it.
    if report.is_clean() {
        match tokio::task::spawn_blocking(move || source.join()).await {
            Ok(Ok(accepted)) => tracing::info!("Event source stopped after {accepted} events"),
            Ok(Err(_)) => tracing::error!("Event source thread panicked"),
            Err(e) => tracing::error!("Failed to join event source thread: {e}"),
        }
    }

    for worker in &report.workers {
        tracing::debug!(
            "Worker {} processed {} events ({} faults)",
            worker.worker_id,
            worker.processed,
            worker.faults
        );
    }
    tracing::info!(
        "Submitted {}, forwarded {}, dropped {}, processed {}, faults {}",
        report.stats.submitted,
        report.stats.forwarded,
        report.stats.dropped,
        report.stats.processed,
        report.stats.faults
    );

    providers.shutdown();

    match report.drain {
        DrainOutcome::Completed => {
            tracing::info!("All workers done, shutting down!");
            Ok(())
        }
        DrainOutcome::ForcedTermination { remaining } => {
            bail!("Drain timed out with {remaining} workers still running")
        }
    }
}

fn log_startup_info(config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting fanout pipeline with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Starting fanout pipeline with {} workers",
            config.pipeline.num_workers
        );
    }
}

/// Resolves on the first SIGINT/SIGTERM and raises the pipeline's
/// cancellation signal.
///
/// A second signal while draining is logged and ignored; cancellation is
/// already in progress.
async fn shutdown_signal(coordinator: ShutdownCoordinator) {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Shutdown signal received, draining workers...");
    coordinator.initiate();

    tokio::spawn(async move {
        while signal::ctrl_c().await.is_ok() {
            if !coordinator.initiate() {
                tracing::warn!("Already shutting down, waiting for workers to drain");
            }
        }
    });
}
