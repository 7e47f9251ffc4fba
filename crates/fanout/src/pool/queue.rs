//! The bounded multi-consumer work queue between the dispatcher and the pool.
//!
//! Events travel through a `flume` channel. Alongside it runs a [`Notify`]
//! that every receive (and every dropped receiver) pokes, which lets
//! [`WorkSender::send`] wait for a free slot without handing the event to the
//! channel first. Dropping a pending `send` therefore never leaves the event
//! half-delivered: either it is in the queue and `send` returned `Ok`, or the
//! caller still owns it.

use crate::event::Event;
use std::sync::Arc;
use tokio::sync::Notify;

/// Creates a work queue that holds at most `capacity` events.
pub fn bounded(capacity: usize) -> (WorkSender, WorkReceiver) {
    let (tx, rx) = flume::bounded(capacity);
    let freed = Arc::new(Notify::new());
    (
        WorkSender {
            tx,
            freed: freed.clone(),
        },
        WorkReceiver { rx, freed },
    )
}

/// The producing half. Dropping it closes the queue.
#[derive(Debug)]
pub struct WorkSender {
    tx: flume::Sender<Event>,
    freed: Arc<Notify>,
}

impl WorkSender {
    /// Places `event` in the queue, waiting for a free slot.
    ///
    /// Cancel-safe: if the returned future is dropped before completing, the
    /// event was not queued.
    ///
    /// # Errors
    ///
    /// Returns the event when every receiver is gone.
    pub async fn send(&self, mut event: Event) -> Result<(), Event> {
        loop {
            // Registered before the attempt so a slot freed in between still
            // leaves a permit behind.
            let freed = self.freed.notified();
            match self.tx.try_send(event) {
                Ok(()) => return Ok(()),
                Err(flume::TrySendError::Full(returned)) => {
                    event = returned;
                    freed.await;
                }
                Err(flume::TrySendError::Disconnected(returned)) => return Err(returned),
            }
        }
    }
}

/// A consuming half. Clones compete for events; each event goes to one of
/// them.
#[derive(Clone, Debug)]
pub struct WorkReceiver {
    rx: flume::Receiver<Event>,
    freed: Arc<Notify>,
}

impl WorkReceiver {
    /// Takes the next event, or `None` once the queue is closed and empty.
    pub async fn recv(&self) -> Option<Event> {
        let event = self.rx.recv_async().await.ok()?;
        self.freed.notify_one();
        Some(event)
    }
}

impl Drop for WorkReceiver {
    fn drop(&mut self) {
        // A sender waiting for space re-checks and may find no receivers left.
        self.freed.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn send_waits_for_a_receive() {
        let (tx, rx) = bounded(1);
        tx.send(Event::new(0)).await.unwrap();

        let rx_task = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let first = rx.recv().await;
            let second = rx.recv().await;
            (first, second)
        });

        timeout(Duration::from_secs(1), tx.send(Event::new(1)))
            .await
            .expect("a receive frees a slot")
            .unwrap();
        drop(tx);

        let (first, second) = rx_task.await.unwrap();
        assert_eq!(first, Some(Event::new(0)));
        assert_eq!(second, Some(Event::new(1)));
    }

    #[tokio::test]
    async fn abandoned_send_does_not_enqueue() {
        let (tx, rx) = bounded(1);
        tx.send(Event::new(0)).await.unwrap();

        let attempt = timeout(Duration::from_millis(20), tx.send(Event::new(1))).await;
        assert!(attempt.is_err(), "queue is full");

        drop(tx);
        assert_eq!(rx.recv().await, Some(Event::new(0)));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn send_fails_once_every_receiver_is_dropped() {
        let (tx, rx) = bounded(1);
        tx.send(Event::new(0)).await.unwrap();

        let waiting = tokio::spawn(async move { tx.send(Event::new(1)).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(rx);

        let result = timeout(Duration::from_secs(1), waiting)
            .await
            .expect("dropping the receiver wakes the sender")
            .unwrap();
        assert_eq!(result, Err(Event::new(1)));
    }
}
