//! Durable checkpoint persistence: row-per-run key/value surface with JSON payloads
//! (§4.4, §6 "Checkpoint row").

use std::path::{Path, PathBuf};

use rusqlite::{params, OptionalExtension};
use thiserror::Error;

use super::state::{RunStatus, WorkflowState};

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serialize checkpoint: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("background task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("stored status {0:?} is not a recognized RunStatus")]
    UnknownStatus(String),
}

/// SQLite-backed checkpoint store. One row per run, keyed by run_id.
pub struct SqliteCheckpointStore {
    db_path: PathBuf,
}

impl SqliteCheckpointStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, CheckpointError> {
        let db_path = path.as_ref().to_path_buf();
        let conn = rusqlite::Connection::open(&db_path)?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS checkpoints (
                run_id TEXT PRIMARY KEY,
                execution_queue TEXT NOT NULL,
                context_data TEXT NOT NULL,
                status TEXT NOT NULL,
                error TEXT,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )?;
        Ok(Self { db_path })
    }

    /// Upserts the checkpoint for `state.run_id`.
    pub async fn save_checkpoint(&self, state: WorkflowState) -> Result<(), CheckpointError> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), CheckpointError> {
            let conn = rusqlite::Connection::open(&db_path)?;
            let queue_json = serde_json::to_string(&state.execution_queue)?;
            let context_json = serde_json::to_string(&state.output_cache)?;
            let status = status_to_str(state.status);
            conn.execute(
                "INSERT INTO checkpoints (run_id, execution_queue, context_data, status, error, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
                 ON CONFLICT(run_id) DO UPDATE SET \
                   execution_queue = excluded.execution_queue, \
                   context_data = excluded.context_data, \
                   status = excluded.status, \
                   error = excluded.error, \
                   updated_at = excluded.updated_at",
                params![
                    state.run_id,
                    queue_json,
                    context_json,
                    status,
                    state.error,
                    state.updated_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await?
    }

    /// Loads the checkpoint for `run_id`, or `None` if no row exists.
    ///
    /// Tolerates a legacy row shape where `execution_queue` holds a single JSON
    /// string (a bare `current_node_id`) rather than an array, wrapping it as a
    /// one-element queue.
    pub async fn load_checkpoint(
        &self,
        run_id: &str,
    ) -> Result<Option<WorkflowState>, CheckpointError> {
        let db_path = self.db_path.clone();
        let run_id = run_id.to_string();
        tokio::task::spawn_blocking(move || -> Result<Option<WorkflowState>, CheckpointError> {
            let conn = rusqlite::Connection::open(&db_path)?;
            let row = conn
                .query_row(
                    "SELECT run_id, execution_queue, context_data, status, error, updated_at \
                     FROM checkpoints WHERE run_id = ?1",
                    params![run_id],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, Option<String>>(4)?,
                            row.get::<_, String>(5)?,
                        ))
                    },
                )
                .optional()?;

            let Some((run_id, queue_json, context_json, status_str, error, updated_at)) = row
            else {
                return Ok(None);
            };

            let execution_queue = parse_execution_queue(&queue_json)?;
            let output_cache = serde_json::from_str(&context_json)?;
            let status = status_from_str(&status_str)?;
            let updated_at = chrono::DateTime::parse_from_rfc3339(&updated_at)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .unwrap_or_else(|_| chrono::Utc::now());

            Ok(Some(WorkflowState {
                run_id,
                execution_queue,
                output_cache,
                status,
                error,
                updated_at,
            }))
        })
        .await?
    }
}

fn parse_execution_queue(raw: &str) -> Result<Vec<String>, CheckpointError> {
    if let Ok(queue) = serde_json::from_str::<Vec<String>>(raw) {
        return Ok(queue);
    }
    // Legacy schema: a bare JSON string holding a single current_node_id.
    let single: String = serde_json::from_str(raw)?;
    Ok(vec![single])
}

fn status_to_str(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Pending => "pending",
        RunStatus::Running => "running",
        RunStatus::Suspended => "suspended",
        RunStatus::Completed => "completed",
        RunStatus::Failed => "failed",
        RunStatus::Stopped => "stopped",
    }
}

fn status_from_str(s: &str) -> Result<RunStatus, CheckpointError> {
    match s {
        "pending" => Ok(RunStatus::Pending),
        "running" => Ok(RunStatus::Running),
        "suspended" => Ok(RunStatus::Suspended),
        "completed" => Ok(RunStatus::Completed),
        "failed" => Ok(RunStatus::Failed),
        "stopped" => Ok(RunStatus::Stopped),
        other => Err(CheckpointError::UnknownStatus(other.to_string())),
    }
}
