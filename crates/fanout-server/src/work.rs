use core::time::Duration;
use fanout::{Event, ProcessError};
use rand::Rng;

/// Simulated user work: sleeps for a random duration within a fixed range.
#[derive(Clone, Copy, Debug)]
pub struct SimulatedWork {
    min: Duration,
    max: Duration,
}

impl SimulatedWork {
    pub const fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    fn pick_duration(&self) -> Duration {
        if self.min >= self.max {
            return self.min;
        }
        rand::rng().random_range(self.min..=self.max)
    }
}

impl fanout::Processor for SimulatedWork {
    async fn process(&self, worker_id: usize, event: Event) -> Result<(), ProcessError> {
        let duration = self.pick_duration();
        tracing::info!("Worker {worker_id} started job {}", event.id());
        tokio::time::sleep(duration).await;
        tracing::info!(
            "Worker {worker_id} finished job {} in {:?}",
            event.id(),
            duration
        );
        Ok(())
    }
}
