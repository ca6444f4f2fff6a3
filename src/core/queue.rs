//! Unbounded handoff between transport callbacks and the pump loop.
//!
//! The transport side must never block inside its event loop, so the queue
//! is unbounded: enqueue always succeeds immediately and memory absorbs any
//! burst the sink is too slow for.

use tokio::sync::mpsc;
use tracing::debug;

/// A raw reading as received from the transport, before any conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Original topic, untouched.
    pub topic: String,
    /// Payload decoded as UTF-8 text.
    pub payload: String,
}

impl RawEvent {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Producer half. Cheap to clone, one per transport task.
#[derive(Debug, Clone)]
pub struct IngestHandle {
    tx: mpsc::UnboundedSender<RawEvent>,
}

impl IngestHandle {
    /// Appends an event without blocking. If the consumer is gone the event
    /// is dropped; the process is shutting down at that point anyway.
    pub fn enqueue(&self, event: RawEvent) {
        if let Err(err) = self.tx.send(event) {
            debug!("ingest queue closed, dropping event: {}", err.0.topic);
        }
    }
}

/// Consumer half, owned by the pump loop.
#[derive(Debug)]
pub struct IngestQueue {
    rx: mpsc::UnboundedReceiver<RawEvent>,
}

impl IngestQueue {
    /// Creates a connected handle/queue pair.
    pub fn channel() -> (IngestHandle, IngestQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        (IngestHandle { tx }, IngestQueue { rx })
    }

    /// Waits for the next event. Returns `None` once every producer handle
    /// has been dropped and the buffer is drained, which ends the pump loop.
    pub async fn dequeue(&mut self) -> Option<RawEvent> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fifo_order() {
        let (handle, mut queue) = IngestQueue::channel();
        for i in 0..10 {
            handle.enqueue(RawEvent::new(format!("/t/{i}"), i.to_string()));
        }
        drop(handle);

        let mut seen = Vec::new();
        while let Some(event) = queue.dequeue().await {
            seen.push(event.payload);
        }
        let expected: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn test_dequeue_returns_none_after_producers_drop() {
        let (handle, mut queue) = IngestQueue::channel();
        handle.enqueue(RawEvent::new("/a", "1"));
        drop(handle);

        assert_eq!(queue.dequeue().await, Some(RawEvent::new("/a", "1")));
        assert_eq!(queue.dequeue().await, None);
    }

    #[tokio::test]
    async fn test_multiple_producers_deliver_exactly_once() {
        let (handle, mut queue) = IngestQueue::channel();

        let mut tasks = Vec::new();
        for producer in 0..4 {
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move {
                for i in 0..25 {
                    handle.enqueue(RawEvent::new(
                        format!("/p{producer}"),
                        format!("{producer}:{i}"),
                    ));
                }
            }));
        }
        drop(handle);
        for task in tasks {
            task.await.unwrap();
        }

        let mut per_producer: Vec<Vec<u32>> = vec![Vec::new(); 4];
        while let Some(event) = queue.dequeue().await {
            let (producer, seq) = event.payload.split_once(':').unwrap();
            per_producer[producer.parse::<usize>().unwrap()].push(seq.parse().unwrap());
        }

        // every event arrives exactly once, and per-producer order survives
        // the interleaving
        for seqs in &per_producer {
            assert_eq!(*seqs, (0..25).collect::<Vec<u32>>());
        }
    }

    #[tokio::test]
    async fn test_slow_consumer_loses_nothing() {
        let (handle, mut queue) = IngestQueue::channel();
        for i in 0..1000 {
            handle.enqueue(RawEvent::new("/burst", i.to_string()));
        }
        drop(handle);

        let mut count = 0;
        while queue.dequeue().await.is_some() {
            count += 1;
        }
        assert_eq!(count, 1000);
    }

    #[tokio::test]
    async fn test_enqueue_after_consumer_drop_does_not_panic() {
        let (handle, queue) = IngestQueue::channel();
        drop(queue);
        handle.enqueue(RawEvent::new("/late", "ignored"));
    }
}
