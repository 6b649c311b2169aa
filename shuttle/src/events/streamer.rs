//! Per-run façade over the bus and store, assigning seq_ids and applying the
//! criticality persistence policy (§4.2, §4.3).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::Stream;
use serde_json::Value;
use stream_event::Envelope;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::bus::{EventBus, EventBusError};
use super::store::{EventStoreError, SqliteEventStore};

#[derive(Debug, Error)]
pub enum StreamerError {
    #[error(transparent)]
    Bus(#[from] EventBusError),
    #[error("persisting critical event failed: {0}")]
    Store(#[from] EventStoreError),
}

/// Emits, persists and replays events for a single run.
///
/// seq_id is assigned here, monotonically per run, starting at 1 for the first
/// emitted event (0 is reserved to mean "no events yet" for backfill cursors).
pub struct Streamer {
    run_id: String,
    bus: Arc<EventBus>,
    store: Arc<SqliteEventStore>,
    next_seq_id: AtomicU64,
}

impl Streamer {
    pub fn new(run_id: impl Into<String>, bus: Arc<EventBus>, store: Arc<SqliteEventStore>) -> Self {
        Self::resuming_from(run_id, bus, store, 0)
    }

    /// Builds a streamer whose first emitted event gets `last_persisted_seq_id + 1`,
    /// so a resumed run's events continue the durable sequence rather than
    /// restarting at 1 and colliding with rows already written for this run id
    /// (§3: seq_id is dense, monotonic, and strictly ordered within a run).
    pub fn resuming_from(
        run_id: impl Into<String>,
        bus: Arc<EventBus>,
        store: Arc<SqliteEventStore>,
        last_persisted_seq_id: u64,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            bus,
            store,
            next_seq_id: AtomicU64::new(last_persisted_seq_id),
        }
    }

    /// Emits an event for this run.
    ///
    /// Critical events (§4.3: lifecycle boundaries such as `node_started` /
    /// `node_finished` / `workflow_failed`) are persisted synchronously before this
    /// call returns; a persist failure is propagated as an execution error rather
    /// than swallowed. Non-critical events (e.g. `stream_token`) are persisted in
    /// the background; a failure there is logged and does not fail the run.
    pub async fn emit(
        &self,
        event_type: impl Into<String>,
        payload: Value,
        producer_node_id: Option<String>,
    ) -> Result<Envelope, StreamerError> {
        let event_type = event_type.into();
        let seq_id = self.next_seq_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut envelope = Envelope::new(&self.run_id, seq_id, event_type, payload);
        if let Some(producer) = producer_node_id {
            envelope = envelope.with_producer(producer);
        }

        if envelope.is_critical() {
            self.store.save(envelope.clone()).await?;
            self.bus.publish(&self.run_id, envelope.clone())?;
        } else {
            self.bus.publish(&self.run_id, envelope.clone())?;
            let store = Arc::clone(&self.store);
            let background = envelope.clone();
            tokio::spawn(async move {
                if let Err(err) = store.save(background).await {
                    tracing::warn!(error = %err, "streamer: background persist of non-critical event failed");
                }
            });
        }

        Ok(envelope)
    }

    /// Subscribes to live events for this run, backfilled from `after_seq_id`.
    pub fn listen(&self, after_seq_id: u64) -> Result<mpsc::Receiver<Envelope>, StreamerError> {
        Ok(self.bus.subscribe(&self.run_id, after_seq_id)?)
    }

    /// Same as [`Self::listen`], wrapped as a [`Stream`] for callers that compose
    /// via `futures`/`tokio_stream` combinators instead of polling a channel directly.
    pub fn listen_stream(
        &self,
        after_seq_id: u64,
    ) -> Result<impl Stream<Item = Envelope>, StreamerError> {
        Ok(ReceiverStream::new(self.listen(after_seq_id)?))
    }

    /// Returns the full durable history for this run, in order.
    pub async fn sync_history(&self) -> Result<Vec<Envelope>, StreamerError> {
        Ok(self.store.get_events(&self.run_id, 0).await?)
    }
}
