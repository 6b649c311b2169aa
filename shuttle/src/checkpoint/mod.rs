//! Checkpoint Store: persists and reloads per-run execution state (§4.4).

mod sqlite_store;
mod state;

pub use sqlite_store::{CheckpointError, SqliteCheckpointStore};
pub use state::{RunStatus, WorkflowState};
