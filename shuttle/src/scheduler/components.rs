//! Built-in map/fan-out component: executes a child sub-workflow once per input
//! list element with bounded concurrency, preserving input order in the output
//! regardless of completion order (§4.6 "Map/fan-out construct").

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Semaphore;

use super::component::{Component, ComponentError};
use super::context::ExecutionContext;
use super::graph::{Graph, WorkflowDefinition};

/// A node whose `config` carries a child `graph` (a [`WorkflowDefinition`]) and
/// whose resolved `inputs["items"]` is the list to fan out over. One child run is
/// started per element, each seeing `item`/`index` as value-resolver overrides.
pub struct MapComponent;

#[async_trait]
impl Component for MapComponent {
    async fn invoke(
        &self,
        inputs: HashMap<String, Value>,
        config: HashMap<String, Value>,
        ctx: &ExecutionContext,
    ) -> Result<Value, ComponentError> {
        let items = inputs
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| ComponentError::Validation("map node requires an `items` array input".to_string()))?;

        let graph_value = config
            .get("graph")
            .ok_or_else(|| ComponentError::Validation("map node requires a `graph` config".to_string()))?;
        let graph_def: WorkflowDefinition = serde_json::from_value(graph_value.clone())
            .map_err(|err| ComponentError::Validation(format!("map node `graph` config: {err}")))?;
        let graph = Arc::new(
            Graph::from_definition(graph_def).map_err(|err| ComponentError::Validation(err.to_string()))?,
        );

        let concurrency = config
            .get("concurrency")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(ctx.default_map_concurrency)
            .max(1);
        let name = config.get("id").and_then(Value::as_str).unwrap_or("map").to_string();

        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut handles = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let graph = Arc::clone(&graph);
            let executor = Arc::clone(&ctx.sub_workflow_executor);
            let run_id = ctx.run_id.clone();
            let variables = ctx.snapshot_variables();
            let name = name.clone();

            handles.push(tokio::spawn(async move {
                // The semaphore is never closed while this task holds a strong
                // reference to it, so acquiring here cannot fail.
                let _permit = semaphore.acquire_owned().await.expect("map semaphore closed while in use");
                let mut overrides = HashMap::new();
                overrides.insert("item".to_string(), item);
                overrides.insert("index".to_string(), Value::from(index as u64));
                executor
                    .execute(&run_id, &format!("{name}_{index}"), graph, Value::Null, variables, overrides)
                    .await
            }));
        }

        let mut outputs = Vec::with_capacity(handles.len());
        for handle in handles {
            let joined = handle.await.map_err(|err| ComponentError::Execution(err.to_string()))?;
            let output = joined.map_err(|err| ComponentError::Execution(err.to_string()))?;
            outputs.push(output);
        }

        Ok(Value::Array(outputs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::context::SubWorkflowExecutor;
    use crate::scheduler::resource::NoopResourceManager;
    use crate::scheduler::SchedulerError;
    use crate::events::Streamer;

    /// Fan-out target: squares `item` directly, without actually driving a
    /// sub-workflow scheduler, to exercise `MapComponent`'s concurrency and
    /// ordering in isolation from the scheduler's own graph-walking.
    struct SquaringExecutor;

    #[async_trait]
    impl SubWorkflowExecutor for SquaringExecutor {
        async fn execute(
            &self,
            _parent_run_id: &str,
            _name: &str,
            _graph: Arc<Graph>,
            _initial_inputs: Value,
            _inherited_variables: HashMap<String, Value>,
            overrides: HashMap<String, Value>,
        ) -> Result<Value, SchedulerError> {
            let item = overrides["item"].as_i64().unwrap();
            Ok(serde_json::json!({"r": item * item}))
        }
    }

    fn test_ctx(executor: Arc<dyn SubWorkflowExecutor>, dir: &tempfile::TempDir) -> ExecutionContext {
        let bus = Arc::new(crate::events::EventBus::new());
        let store = Arc::new(crate::events::SqliteEventStore::new(dir.path().join("e.db")).unwrap());
        ExecutionContext::new(
            "run-1".to_string(),
            HashMap::new(),
            HashMap::new(),
            Arc::new(Streamer::new("run-1", bus, store)),
            Arc::new(NoopResourceManager),
            executor,
            5,
        )
    }

    /// **Scenario 6 from the spec**: a map node over `[1,2,3]` with concurrency 2
    /// yields `[{r:1},{r:4},{r:9}]` in input order.
    #[tokio::test]
    async fn scenario_6_map_fan_out_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(Arc::new(SquaringExecutor), &dir);
        let component = MapComponent;

        let mut inputs = HashMap::new();
        inputs.insert("items".to_string(), serde_json::json!([1, 2, 3]));

        let trivial_graph = serde_json::json!({"nodes": [{"id": "x", "component_type": "noop"}], "edges": [], "entry": "x"});
        let mut config = HashMap::new();
        config.insert("graph".to_string(), trivial_graph);
        config.insert("concurrency".to_string(), serde_json::json!(2));
        config.insert("id".to_string(), serde_json::json!("map1"));

        let output = component.invoke(inputs, config, &ctx).await.unwrap();
        assert_eq!(output, serde_json::json!([{"r": 1}, {"r": 4}, {"r": 9}]));
    }

    /// **Scenario**: a missing `items` input is a validation error.
    #[tokio::test]
    async fn missing_items_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(Arc::new(SquaringExecutor), &dir);
        let component = MapComponent;
        let mut config = HashMap::new();
        config.insert("graph".to_string(), serde_json::json!({"nodes": [], "edges": [], "entry": "x"}));
        let err = component.invoke(HashMap::new(), config, &ctx).await.unwrap_err();
        assert!(matches!(err, ComponentError::Validation(_)));
    }
}
