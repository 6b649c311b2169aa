//! Lifecycle hooks, with no-op defaults so an implementor only overrides what it
//! needs (§1.2, §4.6 "Lifecycle hooks").

use async_trait::async_trait;
use serde_json::Value;

/// A hook that raises is logged and suppressed by the scheduler; hook failure must
/// never abort a workflow, so each method returns `Result<(), String>` rather than
/// panicking or propagating.
#[async_trait]
pub trait WorkflowHook: Send + Sync {
    async fn on_workflow_start(&self, _run_id: &str) -> Result<(), String> {
        Ok(())
    }
    async fn on_node_start(&self, _run_id: &str, _node_id: &str) -> Result<(), String> {
        Ok(())
    }
    async fn on_node_end(&self, _run_id: &str, _node_id: &str, _output: &Value) -> Result<(), String> {
        Ok(())
    }
    async fn on_workflow_end(&self, _run_id: &str, _output: &Value) -> Result<(), String> {
        Ok(())
    }
    async fn on_workflow_error(&self, _run_id: &str, _error: &str) -> Result<(), String> {
        Ok(())
    }
}
