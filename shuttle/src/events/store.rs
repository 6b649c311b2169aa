//! Durable append-only event log, keyed by (run_id, seq_id) (§4.2, §6 "Event row").

use std::path::{Path, PathBuf};

use rusqlite::params;
use stream_event::Envelope;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventStoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serialize event: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("background task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Durable event log backed by SQLite. Opens a fresh connection per call via
/// `spawn_blocking`, matching the pattern used by the rest of the ambient SQL
/// persistence in this workspace rather than holding one connection behind an
/// async mutex.
pub struct SqliteEventStore {
    db_path: PathBuf,
}

impl SqliteEventStore {
    /// Opens (creating if absent) the event log at `path` and ensures its schema exists.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, EventStoreError> {
        let db_path = path.as_ref().to_path_buf();
        let conn = rusqlite::Connection::open(&db_path)?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                run_id TEXT NOT NULL,
                seq_id INTEGER NOT NULL,
                type TEXT NOT NULL,
                timestamp REAL NOT NULL,
                event_json TEXT NOT NULL,
                UNIQUE(run_id, seq_id)
            )
            "#,
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_events_run_seq ON events (run_id, seq_id)",
            [],
        )?;
        Ok(Self { db_path })
    }

    /// Persists `event`. Idempotent under retry: a second save of the same
    /// (run_id, seq_id) is a no-op rather than an error or a duplicate row.
    pub async fn save(&self, event: Envelope) -> Result<(), EventStoreError> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), EventStoreError> {
            let conn = rusqlite::Connection::open(&db_path)?;
            let event_json = serde_json::to_string(&event)?;
            let timestamp = event.timestamp.timestamp_millis() as f64 / 1000.0;
            conn.execute(
                "INSERT OR IGNORE INTO events (id, run_id, seq_id, type, timestamp, event_json) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    event.id,
                    event.run_id,
                    event.seq_id as i64,
                    event.event_type,
                    timestamp,
                    event_json,
                ],
            )?;
            Ok(())
        })
        .await?
    }

    /// Returns events for `run_id` with `seq_id > after_seq_id`, ascending by seq_id.
    pub async fn get_events(
        &self,
        run_id: &str,
        after_seq_id: u64,
    ) -> Result<Vec<Envelope>, EventStoreError> {
        let db_path = self.db_path.clone();
        let run_id = run_id.to_string();
        tokio::task::spawn_blocking(move || -> Result<Vec<Envelope>, EventStoreError> {
            let conn = rusqlite::Connection::open(&db_path)?;
            let mut stmt = conn.prepare(
                "SELECT event_json FROM events WHERE run_id = ?1 AND seq_id > ?2 ORDER BY seq_id ASC",
            )?;
            let rows = stmt.query_map(params![run_id, after_seq_id as i64], |row| {
                row.get::<_, String>(0)
            })?;
            let mut events = Vec::new();
            for row in rows {
                let json = row?;
                events.push(serde_json::from_str(&json)?);
            }
            Ok(events)
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(run_id: &str, seq_id: u64) -> Envelope {
        Envelope::new(run_id, seq_id, "node_started", serde_json::json!({"k": "v"}))
    }

    /// **Scenario**: an event saved can be read back via get_events.
    #[tokio::test]
    async fn save_then_get_events_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteEventStore::new(dir.path().join("events.db")).unwrap();
        store.save(env("run-1", 1)).await.unwrap();
        store.save(env("run-1", 2)).await.unwrap();

        let events = store.get_events("run-1", 0).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].seq_id, 1);
        assert_eq!(events[1].seq_id, 2);
    }

    /// **Scenario**: get_events only returns events after the given seq_id, ascending.
    #[tokio::test]
    async fn get_events_filters_by_after_seq_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteEventStore::new(dir.path().join("events.db")).unwrap();
        for seq in 1..=5 {
            store.save(env("run-1", seq)).await.unwrap();
        }
        let events = store.get_events("run-1", 3).await.unwrap();
        assert_eq!(
            events.iter().map(|e| e.seq_id).collect::<Vec<_>>(),
            vec![4, 5]
        );
    }

    /// **Scenario**: saving the same (run_id, seq_id) twice is idempotent — no duplicate row.
    #[tokio::test]
    async fn save_is_idempotent_under_retry() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteEventStore::new(dir.path().join("events.db")).unwrap();
        let event = env("run-1", 1);
        store.save(event.clone()).await.unwrap();
        store.save(event).await.unwrap();

        let events = store.get_events("run-1", 0).await.unwrap();
        assert_eq!(events.len(), 1);
    }

    /// **Scenario**: different runs are independent in the store.
    #[tokio::test]
    async fn events_are_scoped_per_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteEventStore::new(dir.path().join("events.db")).unwrap();
        store.save(env("run-a", 1)).await.unwrap();
        store.save(env("run-b", 1)).await.unwrap();

        assert_eq!(store.get_events("run-a", 0).await.unwrap().len(), 1);
        assert_eq!(store.get_events("run-b", 0).await.unwrap().len(), 1);
    }
}
