//! Per-run mutable execution context (§3 "Execution Context").

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use crate::events::Streamer;
use crate::value::DataSource;

use super::graph::Graph;
use super::resource::ResourceManager;
use super::SchedulerError;

/// A component's handle for requesting a child run (§4.6 "Sub-workflow execution",
/// "Map/fan-out construct").
#[async_trait]
pub trait SubWorkflowExecutor: Send + Sync {
    /// Executes `graph` as a child run of `parent_run_id`, named `name`. The child
    /// run id is derived as `{parent_run_id}::{name}_{4-hex-suffix}`. `inherited_variables`
    /// carries the parent's variables forward; `overrides` (e.g. `item`/`index` for a
    /// map fan-out element) take priority over them.
    async fn execute(
        &self,
        parent_run_id: &str,
        name: &str,
        graph: Arc<Graph>,
        initial_inputs: Value,
        inherited_variables: HashMap<String, Value>,
        overrides: HashMap<String, Value>,
    ) -> Result<Value, SchedulerError>;
}

/// Per-run mutable state: the output cache and global variables, plus the injected
/// service handles a component may use. Invariants (§3): the output cache only gains
/// entries during execution of the current run; service handles are never persisted.
pub struct ExecutionContext {
    pub run_id: String,
    output_cache: RwLock<HashMap<String, Value>>,
    variables: RwLock<HashMap<String, Value>>,
    pub streamer: Arc<Streamer>,
    pub resource_manager: Arc<dyn ResourceManager>,
    pub sub_workflow_executor: Arc<dyn SubWorkflowExecutor>,
    pub default_map_concurrency: usize,
}

impl ExecutionContext {
    pub fn new(
        run_id: String,
        output_cache: HashMap<String, Value>,
        variables: HashMap<String, Value>,
        streamer: Arc<Streamer>,
        resource_manager: Arc<dyn ResourceManager>,
        sub_workflow_executor: Arc<dyn SubWorkflowExecutor>,
        default_map_concurrency: usize,
    ) -> Self {
        Self {
            run_id,
            output_cache: RwLock::new(output_cache),
            variables: RwLock::new(variables),
            streamer,
            resource_manager,
            sub_workflow_executor,
            default_map_concurrency,
        }
    }

    /// Builds a fresh [`DataSource`] snapshot of the current output cache and variables
    /// for the Value Resolver to navigate.
    pub fn data_source(&self) -> DataSource {
        let outputs = self.output_cache.read().expect("output cache lock poisoned").clone();
        let variables = self.variables.read().expect("variables lock poisoned").clone();
        DataSource::new(outputs, variables)
    }

    pub fn set_output(&self, node_id: &str, value: Value) {
        self.output_cache
            .write()
            .expect("output cache lock poisoned")
            .insert(node_id.to_string(), value);
    }

    pub fn get_output(&self, node_id: &str) -> Option<Value> {
        self.output_cache.read().expect("output cache lock poisoned").get(node_id).cloned()
    }

    pub fn snapshot_output_cache(&self) -> HashMap<String, Value> {
        self.output_cache.read().expect("output cache lock poisoned").clone()
    }

    pub fn snapshot_variables(&self) -> HashMap<String, Value> {
        self.variables.read().expect("variables lock poisoned").clone()
    }

    pub fn set_variable(&self, name: &str, value: Value) {
        self.variables.write().expect("variables lock poisoned").insert(name.to_string(), value);
    }
}
