//! Component contract (§6 "Component contract").

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::context::ExecutionContext;

/// A component's failure, distinguished by effect per §7: a validation error is
/// always the node/component's fault; an execution error is a runtime failure that
/// still leaves the node eligible for external retry via resume.
#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("execution error: {0}")]
    Execution(String),
}

/// Stateless, addressable-by-type-identifier unit of work.
///
/// Components must not mutate the output cache directly; the scheduler applies a
/// returned output to the cache after a successful invocation.
#[async_trait]
pub trait Component: Send + Sync {
    async fn invoke(
        &self,
        inputs: HashMap<String, Value>,
        config: HashMap<String, Value>,
        ctx: &ExecutionContext,
    ) -> Result<Value, ComponentError>;
}

/// Registry of components by type identifier, built once and shared across runs.
pub type ComponentRegistry = HashMap<String, std::sync::Arc<dyn Component>>;
