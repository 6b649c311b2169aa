//! Per-run checkpoint DTO (§3 "Workflow State (checkpoint)", §4.4).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A run's lifecycle status. Only `Completed` is terminal for resume purposes;
/// see [`RunStatus::is_terminal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Suspended,
    Completed,
    Failed,
    Stopped,
}

impl RunStatus {
    /// A terminal run has nothing left in its queue to continue; resume restarts
    /// it from the entry node instead of replaying an empty queue (§4.6
    /// "Initialization"). `Failed` and `Stopped` are deliberately excluded: both
    /// leave a non-empty queue behind (the failed node re-prepended, or the node
    /// after the debug stop point) that a resume is expected to continue from.
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed)
    }
}

/// Durable per-run execution state: the pending queue plus the output cache,
/// sufficient to resume a run after process restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    pub run_id: String,
    pub execution_queue: Vec<String>,
    pub output_cache: HashMap<String, Value>,
    pub status: RunStatus,
    pub error: Option<String>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl WorkflowState {
    pub fn new(run_id: impl Into<String>, entry_node: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            execution_queue: vec![entry_node.into()],
            output_cache: HashMap::new(),
            status: RunStatus::Pending,
            error: None,
            updated_at: chrono::Utc::now(),
        }
    }
}
