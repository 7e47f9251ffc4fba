use anyhow::bail;
use clap::{Parser, ValueEnum};
use core::time::Duration;
use fanout::{OverflowPolicy, PipelineConfig, ShutdownPolicy};

/// What the source does when the ingest buffer is full.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowArg {
    /// Wait for the dispatcher to free a slot.
    Block,
    /// Reject the event and log an overflow.
    Reject,
}

/// What happens to events still in the ingest buffer at shutdown.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownArg {
    /// Discard them and report how many were dropped.
    Drop,
    /// Forward them to the workers before closing the work queue.
    Drain,
}

/// Runtime configuration for the `fanout-server` binary.
///
/// These settings control the pool size, the buffering between the simulated
/// source and the workers, and how shutdown treats pending work. All values
/// are parsed from CLI arguments or environment variables.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fanout-server",
    version,
    about = "Feeds a simulated callback source through a bounded worker pool"
)]
pub struct CliArgs {
    /// Number of worker tasks draining the work queue.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS", default_value_t = 4)]
    pub num_workers: usize,

    /// Capacity of the buffer between the source callback and the dispatcher.
    ///
    /// Environment variable: `INGEST_CAPACITY`
    #[arg(long, env = "INGEST_CAPACITY", default_value_t = 1)]
    pub ingest_capacity: usize,

    /// Capacity of the work queue. Defaults to `NUM_WORKERS`.
    ///
    /// Environment variable: `QUEUE_CAPACITY`
    #[arg(long, env = "QUEUE_CAPACITY")]
    pub queue_capacity: Option<usize>,

    /// Milliseconds between two events emitted by the simulated source.
    ///
    /// Environment variable: `EVENT_INTERVAL_MS`
    #[arg(long, env = "EVENT_INTERVAL_MS", default_value_t = 100)]
    pub event_interval_ms: u64,

    /// Lower bound of the simulated processing time per event.
    ///
    /// Environment variable: `WORK_MIN_MS`
    #[arg(long, env = "WORK_MIN_MS", default_value_t = 1000)]
    pub work_min_ms: u64,

    /// Upper bound of the simulated processing time per event.
    ///
    /// Environment variable: `WORK_MAX_MS`
    #[arg(long, env = "WORK_MAX_MS", default_value_t = 3000)]
    pub work_max_ms: u64,

    /// Give up waiting for workers after this many seconds and exit non-zero.
    /// Waits indefinitely when unset.
    ///
    /// Environment variable: `DRAIN_TIMEOUT_SECS`
    #[arg(long, env = "DRAIN_TIMEOUT_SECS")]
    pub drain_timeout_secs: Option<u64>,

    /// Behavior of the source callback when the ingest buffer is full.
    ///
    /// Environment variable: `OVERFLOW_POLICY`
    #[arg(long, env = "OVERFLOW_POLICY", value_enum, default_value_t = OverflowArg::Block)]
    pub overflow_policy: OverflowArg,

    /// Treatment of events still in the ingest buffer at shutdown.
    ///
    /// Environment variable: `SHUTDOWN_POLICY`
    #[arg(long, env = "SHUTDOWN_POLICY", value_enum, default_value_t = ShutdownArg::Drop)]
    pub shutdown_policy: ShutdownArg,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub pipeline: PipelineConfig,
    pub event_interval: Duration,
    pub work_min: Duration,
    pub work_max: Duration,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.work_min_ms > args.work_max_ms {
            bail!(
                "WORK_MIN_MS ({}) must not exceed WORK_MAX_MS ({})",
                args.work_min_ms,
                args.work_max_ms
            );
        }

        if args.drain_timeout_secs == Some(0) {
            bail!("DRAIN_TIMEOUT_SECS must be greater than 0 when set");
        }

        let pipeline = PipelineConfig {
            num_workers: args.num_workers,
            ingest_capacity: args.ingest_capacity,
            queue_capacity: args.queue_capacity,
            overflow_policy: match args.overflow_policy {
                OverflowArg::Block => OverflowPolicy::Block,
                OverflowArg::Reject => OverflowPolicy::Reject,
            },
            shutdown_policy: match args.shutdown_policy {
                ShutdownArg::Drop => ShutdownPolicy::DropPending,
                ShutdownArg::Drain => ShutdownPolicy::DrainPending,
            },
            drain_timeout: args.drain_timeout_secs.map(Duration::from_secs),
        };
        pipeline.validate()?;

        Ok(Self {
            pipeline,
            event_interval: Duration::from_millis(args.event_interval_ms),
            work_min: Duration::from_millis(args.work_min_ms),
            work_max: Duration::from_millis(args.work_max_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, FromArgMatches, builder::Resettable};

    /// Parses `args` with every `env = ...` binding removed, so variables set
    /// in the test environment (or a `.env` file) cannot leak in.
    fn parse(args: &[&str]) -> anyhow::Result<ServerConfig> {
        let matches = CliArgs::command()
            .mut_args(|arg| arg.env(Resettable::Reset))
            .try_get_matches_from(std::iter::once("fanout-server").chain(args.iter().copied()))?;
        let cli = CliArgs::from_arg_matches(&matches)?;
        ServerConfig::try_from(cli)
    }

    #[test]
    fn defaults_match_reference_setup() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.pipeline.num_workers, 4);
        assert_eq!(config.pipeline.ingest_capacity, 1);
        assert_eq!(config.pipeline.work_queue_capacity(), 4);
        assert_eq!(config.pipeline.overflow_policy, OverflowPolicy::Block);
        assert_eq!(config.pipeline.shutdown_policy, ShutdownPolicy::DropPending);
        assert_eq!(config.pipeline.drain_timeout, None);
        assert_eq!(config.event_interval, Duration::from_millis(100));
    }

    #[test]
    fn parses_policies_and_timeout() {
        let config = parse(&[
            "--num-workers",
            "8",
            "--overflow-policy",
            "reject",
            "--shutdown-policy",
            "drain",
            "--drain-timeout-secs",
            "30",
        ])
        .unwrap();
        assert_eq!(config.pipeline.num_workers, 8);
        assert_eq!(config.pipeline.overflow_policy, OverflowPolicy::Reject);
        assert_eq!(config.pipeline.shutdown_policy, ShutdownPolicy::DrainPending);
        assert_eq!(config.pipeline.drain_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn flags_win_over_defaults() {
        let config = parse(&["--num-workers", "2", "--ingest-capacity", "8"]).unwrap();
        assert_eq!(config.pipeline.num_workers, 2);
        assert_eq!(config.pipeline.ingest_capacity, 8);
        assert_eq!(config.pipeline.work_queue_capacity(), 2);
    }

    #[test]
    fn rejects_inverted_work_range_and_empty_pool() {
        assert!(parse(&["--work-min-ms", "10", "--work-max-ms", "5"]).is_err());
        assert!(parse(&["--num-workers", "0"]).is_err());
        assert!(parse(&["--drain-timeout-secs", "0"]).is_err());
    }
}
