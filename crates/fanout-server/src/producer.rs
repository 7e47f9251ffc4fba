//! A stand-in for an external library that pushes events through a callback.
//!
//! The library owns its own thread and knows nothing about the pipeline; it
//! only calls the function it was given with an increasing event index.

use core::time::Duration;
use fanout::{Event, EventSink, SubmitError};
use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};

pub struct Producer {
    sink: Arc<dyn EventSink>,
    interval: Duration,
}

impl Producer {
    pub fn new(sink: Arc<dyn EventSink>, interval: Duration) -> Self {
        Self { sink, interval }
    }

    /// Starts emitting events on a dedicated thread.
    ///
    /// The thread stops once the sink reports it is closed and returns how
    /// many events were accepted.
    pub fn start(self) -> std::io::Result<JoinHandle<u64>> {
        thread::Builder::new()
            .name("event-source".to_string())
            .spawn(move || self.run())
    }

    fn run(self) -> u64 {
        let mut accepted = 0;
        let mut next = 0_u64;

        loop {
            match self.sink.submit(Event::new(next)) {
                Ok(()) => accepted += 1,
                Err(SubmitError::Overflow(event)) => {
                    tracing::warn!("Source overflowed, {event} rejected");
                }
                Err(SubmitError::Closed(event)) => {
                    tracing::info!("Source stopped at {event}, pipeline closed");
                    break;
                }
            }
            next += 1;
            thread::sleep(self.interval);
        }

        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Accepts `limit` events then reports closed.
    struct CountingSink {
        limit: u64,
        seen: Mutex<Vec<Event>>,
    }

    impl EventSink for CountingSink {
        fn submit(&self, event: Event) -> Result<(), SubmitError> {
            let mut seen = self.seen.lock().unwrap();
            if seen.len() as u64 == self.limit {
                return Err(SubmitError::Closed(event));
            }
            if event.id() % 2 == 1 {
                return Err(SubmitError::Overflow(event));
            }
            seen.push(event);
            Ok(())
        }
    }

    #[test]
    fn emits_increasing_ids_until_closed() {
        let sink = Arc::new(CountingSink {
            limit: 3,
            seen: Mutex::new(Vec::new()),
        });
        let producer = Producer::new(sink.clone(), Duration::ZERO);

        let accepted = producer.start().unwrap().join().unwrap();

        assert_eq!(accepted, 3);
        assert_eq!(
            *sink.seen.lock().unwrap(),
            vec![Event::new(0), Event::new(2), Event::new(4)]
        );
    }
}
