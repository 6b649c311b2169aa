//! In-memory pub/sub keyed by run id, with a bounded per-topic ring buffer for replay (§4.2).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use stream_event::Envelope;
use thiserror::Error;
use tokio::sync::mpsc;

/// Default ring buffer capacity per topic (§4.2: "typically 1000").
pub const DEFAULT_RING_CAPACITY: usize = 1000;
/// Default bounded queue size for a single subscriber.
pub const DEFAULT_SUBSCRIBER_QUEUE: usize = 256;
/// Default idle TTL before a topic's ring buffer is garbage collected.
pub const DEFAULT_TOPIC_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Error)]
pub enum EventBusError {
    #[error("event bus internal lock poisoned")]
    LockPoisoned,
}

struct TopicState {
    ring: VecDeque<Envelope>,
    subscribers: Vec<mpsc::Sender<Envelope>>,
    last_activity: Instant,
}

impl TopicState {
    fn new() -> Self {
        Self {
            ring: VecDeque::new(),
            subscribers: Vec::new(),
            last_activity: Instant::now(),
        }
    }
}

struct Topic {
    inner: Mutex<TopicState>,
    capacity: usize,
}

/// Process-local event bus. One topic per run id.
///
/// Shared mutable structure (§5: "the event bus is the sole process-wide shared
/// mutable structure"): fine-grained locking per topic, ring buffer owned by the bus.
pub struct EventBus {
    topics: DashMap<String, Arc<Topic>>,
    ring_capacity: usize,
    subscriber_queue_size: usize,
    ttl: Duration,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_config(
            DEFAULT_RING_CAPACITY,
            DEFAULT_SUBSCRIBER_QUEUE,
            DEFAULT_TOPIC_TTL,
        )
    }

    pub fn with_config(ring_capacity: usize, subscriber_queue_size: usize, ttl: Duration) -> Self {
        Self {
            topics: DashMap::new(),
            ring_capacity,
            subscriber_queue_size,
            ttl,
        }
    }

    fn topic(&self, topic: &str) -> Arc<Topic> {
        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| {
                Arc::new(Topic {
                    inner: Mutex::new(TopicState::new()),
                    capacity: self.ring_capacity,
                })
            })
            .clone()
    }

    /// Publishes `event` to `topic`. Non-blocking: enqueues to every live subscriber,
    /// dropping (and logging) for any subscriber whose queue is full, then appends
    /// to the topic's bounded ring buffer.
    pub fn publish(&self, topic: &str, event: Envelope) -> Result<(), EventBusError> {
        let topic_state = self.topic(topic);
        let mut inner = topic_state
            .inner
            .lock()
            .map_err(|_| EventBusError::LockPoisoned)?;

        inner.subscribers.retain_mut(|sender| {
            match sender.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        run_id = %topic,
                        seq_id = event.seq_id,
                        "event bus: dropping event for slow subscriber"
                    );
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            }
        });

        if inner.ring.len() >= topic_state.capacity {
            inner.ring.pop_front();
        }
        inner.ring.push_back(event);
        inner.last_activity = Instant::now();
        Ok(())
    }

    /// Subscribes to `topic`, backfilling ring-buffered events with `seq_id > after_seq_id`
    /// before the channel begins receiving live events. Backfill and live registration
    /// happen under one lock so no event published concurrently is missed or duplicated.
    pub fn subscribe(
        &self,
        topic: &str,
        after_seq_id: u64,
    ) -> Result<mpsc::Receiver<Envelope>, EventBusError> {
        let topic_state = self.topic(topic);
        let mut inner = topic_state
            .inner
            .lock()
            .map_err(|_| EventBusError::LockPoisoned)?;

        let (tx, rx) = mpsc::channel(self.subscriber_queue_size);
        for event in inner.ring.iter().filter(|e| e.seq_id > after_seq_id) {
            if tx.try_send(event.clone()).is_err() {
                tracing::warn!(
                    run_id = %topic,
                    "event bus: backfill exceeded subscriber queue, truncating replay"
                );
                break;
            }
        }
        inner.subscribers.push(tx);
        inner.last_activity = Instant::now();
        Ok(rx)
    }

    /// Terminates all subscribers of `topic` by dropping their senders; each
    /// subscriber's next `recv()` then returns `None`, the Rust-idiomatic analogue
    /// of sentinel-based close.
    pub fn close_topic(&self, topic: &str) -> Result<(), EventBusError> {
        if let Some(topic_state) = self.topics.get(topic) {
            let mut inner = topic_state
                .inner
                .lock()
                .map_err(|_| EventBusError::LockPoisoned)?;
            inner.subscribers.clear();
        }
        Ok(())
    }

    /// Evicts ring buffers for topics with no subscribers whose last activity
    /// exceeds the configured TTL. Intended to run periodically from a background task.
    pub fn gc(&self) {
        let ttl = self.ttl;
        self.topics.retain(|run_id, topic| {
            let Ok(inner) = topic.inner.lock() else {
                return true;
            };
            let idle = inner.subscribers.is_empty() && inner.last_activity.elapsed() > ttl;
            if idle {
                tracing::debug!(run_id = %run_id, "event bus: evicting idle topic");
            }
            !idle
        });
    }

    /// Spawns a background task that calls [`Self::gc`] on `interval` until the bus
    /// itself is dropped (the `Arc` keeps it alive for as long as the task runs).
    pub fn spawn_gc(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let bus = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                bus.gc();
            }
        })
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
