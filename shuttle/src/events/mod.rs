//! Event Bus & Store: in-memory pub/sub with durable SQLite backing, and the
//! per-run streaming façade that ties the two together (§4.2, §4.3).

mod bus;
mod store;
mod streamer;

pub use bus::{EventBus, EventBusError, DEFAULT_RING_CAPACITY, DEFAULT_SUBSCRIBER_QUEUE, DEFAULT_TOPIC_TTL};
pub use store::{EventStoreError, SqliteEventStore};
pub use streamer::{Streamer, StreamerError};
