//! Workflow Scheduler: loads a graph, executes nodes, handles branching/loops/
//! subgraphs, emits events, checkpoints, resumes (§4.6).

mod component;
mod components;
mod context;
mod control;
mod graph;
mod hooks;
mod resource;

pub use component::{Component, ComponentError, ComponentRegistry};
pub use components::MapComponent;
pub use context::{ExecutionContext, SubWorkflowExecutor};
pub use control::{ACTIVE_HANDLE_KEY, BREAK, CONTINUE, CONTROL_SIGNAL_KEY, SUSPEND_SENTINEL, UI_TYPE_KEY};
pub use graph::{EdgeConfig, Graph, GraphError, NodeConfig, WorkflowDefinition};
pub use hooks::WorkflowHook;
pub use resource::{NoopResourceManager, ResourceManager};

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::checkpoint::{CheckpointError, RunStatus, SqliteCheckpointStore, WorkflowState};
use crate::events::{EventBus, EventStoreError, SqliteEventStore, StreamerError};
use crate::events::Streamer;
use crate::value::{resolve_input_mapping, ResolverError};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Resolver(#[from] ResolverError),
    #[error(transparent)]
    Component(#[from] ComponentError),
    #[error(transparent)]
    Streamer(#[from] StreamerError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    #[error("unknown component type {0:?} for node {1:?}")]
    UnknownComponentType(String, String),
    #[error("workflow failed at node {node_id:?}: {message}")]
    NodeFailed { node_id: String, message: String },
}

impl From<EventStoreError> for SchedulerError {
    fn from(err: EventStoreError) -> Self {
        SchedulerError::Streamer(StreamerError::Store(err))
    }
}

/// Per-call options for [`Scheduler::run`] (§4.6 "Single-run executor. Inputs:").
#[derive(Default)]
pub struct RunOptions {
    pub run_id: Option<String>,
    pub resume: bool,
    /// Caller-supplied inputs merged into the context's variables at resume time
    /// (§6 "Resume protocol"), e.g. a human confirmation value awaited mid-run.
    pub resume_inputs: Option<HashMap<String, Value>>,
    pub resource_manager: Option<Arc<dyn ResourceManager>>,
    /// Debug: stop after this node executes rather than running to completion.
    pub target_node: Option<String>,
}

/// Shared services a single process uses to drive many runs (§5 "Cross-run isolation":
/// each run gets its own context/streamer/topic, but the registry, stores, bus and
/// hooks are process-wide and shared across runs).
pub struct Scheduler {
    components: ComponentRegistry,
    checkpoint_store: Arc<SqliteCheckpointStore>,
    bus: Arc<EventBus>,
    event_store: Arc<SqliteEventStore>,
    hooks: Vec<Arc<dyn WorkflowHook>>,
    default_map_concurrency: usize,
    /// Upgraded into an `Arc<dyn SubWorkflowExecutor>` handed to every run's context,
    /// so a component can request a child run without the scheduler owning a global
    /// singleton (§9 "Global runtime handle": explicit dependency injection instead).
    self_handle: Weak<Scheduler>,
}

impl Scheduler {
    pub fn new(
        components: ComponentRegistry,
        checkpoint_store: Arc<SqliteCheckpointStore>,
        bus: Arc<EventBus>,
        event_store: Arc<SqliteEventStore>,
        hooks: Vec<Arc<dyn WorkflowHook>>,
        default_map_concurrency: usize,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Scheduler {
            components,
            checkpoint_store,
            bus,
            event_store,
            hooks,
            default_map_concurrency,
            self_handle: weak.clone(),
        })
    }

    /// Invariant: a Scheduler only runs while at least one Arc to it is held by its
    /// caller (the Arc returned from `new`), so this upgrade never fails.
    fn self_arc(&self) -> Arc<Scheduler> {
        self.self_handle
            .upgrade()
            .expect("scheduler dropped while a run was in flight")
    }

    fn executor_handle(&self) -> Arc<dyn SubWorkflowExecutor> {
        self.self_arc() as Arc<dyn SubWorkflowExecutor>
    }

    /// Runs `graph` to completion (or suspension/stop), starting fresh or resuming
    /// per `opts` (§4.6 "Initialization", "Main loop", "Resume protocol").
    pub async fn run(
        self: &Arc<Self>,
        graph: Arc<Graph>,
        initial_inputs: Value,
        opts: RunOptions,
    ) -> Result<Value, SchedulerError> {
        let run_id = opts.run_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let checkpoint = if opts.resume {
            self.checkpoint_store.load_checkpoint(&run_id).await?
        } else {
            None
        };

        let resumable = checkpoint
            .as_ref()
            .map(|state| !state.status.is_terminal())
            .unwrap_or(false);

        let (mut queue, output_cache) = if resumable {
            let state = checkpoint.expect("resumable checkpoint is Some by construction");
            (VecDeque::from(state.execution_queue), state.output_cache)
        } else {
            (VecDeque::from([graph.entry().to_string()]), HashMap::new())
        };

        let mut variables: HashMap<String, Value> = initial_inputs
            .as_object()
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        if let Some(resume_inputs) = opts.resume_inputs {
            variables.extend(resume_inputs);
        }

        // On resume, seed the seq_id counter from the last durably persisted event
        // for this run id so emitted events continue the sequence instead of
        // restarting at 1 and colliding with already-stored rows (§3, §8).
        let last_persisted_seq_id = if resumable {
            self.event_store
                .get_events(&run_id, 0)
                .await?
                .last()
                .map(|e| e.seq_id)
                .unwrap_or(0)
        } else {
            0
        };
        let streamer = Arc::new(Streamer::resuming_from(
            run_id.clone(),
            Arc::clone(&self.bus),
            Arc::clone(&self.event_store),
            last_persisted_seq_id,
        ));
        let resource_manager = opts.resource_manager.unwrap_or_else(|| Arc::new(NoopResourceManager));
        let ctx = ExecutionContext::new(
            run_id.clone(),
            output_cache,
            variables,
            Arc::clone(&streamer),
            resource_manager,
            self.executor_handle(),
            self.default_map_concurrency,
        );

        self.call_hooks(|hook| hook.on_workflow_start(&run_id)).await;

        let entry_node = graph.entry().to_string();
        let is_fresh_entry = !resumable;

        match self
            .drive(&graph, &mut queue, &ctx, &entry_node, is_fresh_entry, &initial_inputs, opts.target_node.as_deref())
            .await
        {
            Ok(Outcome::Completed(output)) => {
                self.persist(&run_id, &queue, &ctx, RunStatus::Completed, None).await?;
                streamer
                    .emit(stream_event::event::WORKFLOW_COMPLETED, output.clone(), None)
                    .await?;
                self.call_hooks(|hook| hook.on_workflow_end(&run_id, &output)).await;
                Ok(output)
            }
            Ok(Outcome::Stopped(output)) => {
                self.persist(&run_id, &queue, &ctx, RunStatus::Stopped, None).await?;
                streamer
                    .emit(stream_event::event::WORKFLOW_COMPLETED, output.clone(), None)
                    .await?;
                self.call_hooks(|hook| hook.on_workflow_end(&run_id, &output)).await;
                Ok(output)
            }
            Ok(Outcome::Suspended) => {
                self.persist(&run_id, &queue, &ctx, RunStatus::Suspended, None).await?;
                Ok(Value::Null)
            }
            Err(err) => {
                let message = err.to_string();
                self.persist(&run_id, &queue, &ctx, RunStatus::Failed, Some(message.clone()))
                    .await?;
                streamer
                    .emit(stream_event::event::WORKFLOW_FAILED, Value::String(message.clone()), None)
                    .await?;
                self.call_hooks(|hook| hook.on_workflow_error(&run_id, &message)).await;
                Err(err)
            }
        }
    }

    /// The main execution loop (§4.6 "Main loop"). Pops nodes off `queue`, resolving
    /// and invoking each, routing control flow onto successors, until the queue
    /// drains, a suspend sentinel is hit, or the debug target is reached.
    async fn drive(
        &self,
        graph: &Arc<Graph>,
        queue: &mut VecDeque<String>,
        ctx: &ExecutionContext,
        entry_node: &str,
        mut is_fresh_entry: bool,
        initial_inputs: &Value,
        target_node: Option<&str>,
    ) -> Result<Outcome, SchedulerError> {
        let mut last_output = Value::Null;

        while let Some(node_id) = queue.pop_front() {
            if node_id == SUSPEND_SENTINEL {
                return Ok(Outcome::Suspended);
            }

            let Some(node) = graph.node(&node_id) else {
                tracing::warn!(node_id = %node_id, "scheduler: skipping unknown node id in queue");
                continue;
            };

            let resolved = resolve_input_mapping(&node.input_mapping, &ctx.data_source())?;
            let inputs = if node_id == entry_node && is_fresh_entry {
                is_fresh_entry = false;
                // The entry node's own input mapping is honored if it resolves to
                // anything; an empty/default mapping falls back to the raw initial
                // inputs (wrapped to a single-field `input` map if scalar) so a
                // graph need not declare a redundant pass-through mapping on its
                // entry node (§4.6 step 4).
                if resolved.is_empty() {
                    wrap_scalar_inputs(initial_inputs)
                } else {
                    resolved
                }
            } else {
                resolved
            };

            let mut config: HashMap<String, Value> = node.config.clone();
            config.insert("id".to_string(), Value::String(node_id.clone()));

            let span = tracing::info_span!("node_execution", run_id = %ctx.run_id, node_id = %node_id);
            let _entered = span.enter();

            self.call_hooks(|hook| hook.on_node_start(&ctx.run_id, &node_id)).await;
            ctx.streamer
                .emit(stream_event::event::NODE_STARTED, Value::String(node.component_type.clone()), Some(node_id.clone()))
                .await?;

            let Some(component) = self.components.get(&node.component_type).cloned() else {
                queue.push_front(node_id.clone());
                return Err(SchedulerError::UnknownComponentType(node.component_type.clone(), node_id));
            };

            let output = match component.invoke(inputs, config, ctx).await {
                Ok(output) => output,
                Err(err) => {
                    ctx.streamer
                        .emit(stream_event::event::NODE_ERROR, Value::String(err.to_string()), Some(node_id.clone()))
                        .await?;
                    queue.push_front(node_id.clone());
                    return Err(SchedulerError::NodeFailed { node_id, message: err.to_string() });
                }
            };

            if !output.is_null() {
                ctx.set_output(&node_id, output.clone());
            }
            ctx.streamer
                .emit(stream_event::event::NODE_FINISHED, output.clone(), Some(node_id.clone()))
                .await?;
            self.call_hooks(|hook| hook.on_node_end(&ctx.run_id, &node_id, &output)).await;

            last_output = output.clone();

            route_successors(graph, &node_id, &output, queue);

            if target_node == Some(node_id.as_str()) {
                return Ok(Outcome::Stopped(last_output));
            }
        }

        Ok(Outcome::Completed(last_output))
    }

    async fn persist(
        &self,
        run_id: &str,
        queue: &VecDeque<String>,
        ctx: &ExecutionContext,
        status: RunStatus,
        error: Option<String>,
    ) -> Result<(), SchedulerError> {
        let state = WorkflowState {
            run_id: run_id.to_string(),
            execution_queue: queue.iter().cloned().collect(),
            output_cache: ctx.snapshot_output_cache(),
            status,
            error,
            updated_at: chrono::Utc::now(),
        };
        self.checkpoint_store.save_checkpoint(state).await?;
        Ok(())
    }

    /// Invokes `call` against every registered hook in order; a hook error is
    /// logged and suppressed — hook failure must never abort a workflow (§4.6
    /// "Lifecycle hooks").
    async fn call_hooks<'a, F, Fut>(&'a self, call: F)
    where
        F: Fn(&'a Arc<dyn WorkflowHook>) -> Fut,
        Fut: std::future::Future<Output = Result<(), String>> + 'a,
    {
        for hook in &self.hooks {
            if let Err(err) = call(hook).await {
                tracing::warn!(error = %err, "scheduler: lifecycle hook failed, suppressing");
            }
        }
    }
}

#[async_trait]
impl SubWorkflowExecutor for Scheduler {
    async fn execute(
        &self,
        parent_run_id: &str,
        name: &str,
        graph: Arc<Graph>,
        initial_inputs: Value,
        inherited_variables: HashMap<String, Value>,
        overrides: HashMap<String, Value>,
    ) -> Result<Value, SchedulerError> {
        let suffix: String = (0..4)
            .map(|_| {
                let digit: u8 = rand::random::<u8>() % 16;
                std::char::from_digit(digit as u32, 16).expect("0..16 is a valid hex digit")
            })
            .collect();
        let child_run_id = format!("{parent_run_id}::{name}_{suffix}");

        let mut variables = inherited_variables;
        variables.extend(overrides);
        let mut merged_inputs = initial_inputs
            .as_object()
            .cloned()
            .unwrap_or_default();
        for (k, v) in &variables {
            merged_inputs.entry(k.clone()).or_insert_with(|| v.clone());
        }

        self.self_arc()
            .run(
                graph,
                Value::Object(merged_inputs),
                RunOptions {
                    run_id: Some(child_run_id),
                    resume: false,
                    resume_inputs: None,
                    resource_manager: None,
                    target_node: None,
                },
            )
            .await
    }
}

enum Outcome {
    Completed(Value),
    Stopped(Value),
    Suspended,
}

/// Wraps `initial_inputs` into the entry node's invocation inputs: an object's
/// fields pass straight through; any other JSON value (scalar, array, null) is
/// wrapped under a single `input` field (§4.6 step 4).
fn wrap_scalar_inputs(initial_inputs: &Value) -> HashMap<String, Value> {
    match initial_inputs {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        Value::Null => HashMap::new(),
        other => {
            let mut wrapped = HashMap::new();
            wrapped.insert("input".to_string(), other.clone());
            wrapped
        }
    }
}

/// Chooses and enqueues successor nodes per the output's control-flow annotation
/// (§4.6 step 10-11).
fn route_successors(graph: &Graph, node_id: &str, output: &Value, queue: &mut VecDeque<String>) {
    if output.get(CONTROL_SIGNAL_KEY).is_some() {
        return;
    }

    let active_handle = output.get(ACTIVE_HANDLE_KEY).and_then(Value::as_str);
    for edge in graph.outgoing(node_id) {
        let matches = match active_handle {
            Some(handle) => edge.source_handle.as_deref() == Some(handle),
            None => edge.source_handle.is_none(),
        };
        if matches && !queue.contains(&edge.target) {
            queue.push_back(edge.target.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn make_bus_and_stores(dir: &std::path::Path) -> (Arc<EventBus>, Arc<SqliteEventStore>, Arc<SqliteCheckpointStore>) {
        let bus = Arc::new(EventBus::new());
        let event_store = Arc::new(SqliteEventStore::new(dir.join("events.db")).unwrap());
        let checkpoint_store = Arc::new(SqliteCheckpointStore::new(dir.join("checkpoints.db")).unwrap());
        (bus, event_store, checkpoint_store)
    }

    /// A component built from a plain closure, for scenario tests that just need
    /// deterministic arithmetic on resolved inputs.
    struct ClosureComponent<F>(F);

    #[async_trait]
    impl<F> Component for ClosureComponent<F>
    where
        F: Fn(&Map<String, Value>) -> Value + Send + Sync,
    {
        async fn invoke(
            &self,
            inputs: Map<String, Value>,
            _config: Map<String, Value>,
            _ctx: &ExecutionContext,
        ) -> Result<Value, ComponentError> {
            Ok((self.0)(&inputs))
        }
    }

    fn node(id: &str, component_type: &str, input_mapping: Value) -> NodeConfig {
        NodeConfig {
            id: id.to_string(),
            component_type: component_type.to_string(),
            config: Map::new(),
            input_mapping,
        }
    }

    fn edge(source: &str, target: &str, handle: Option<&str>) -> EdgeConfig {
        EdgeConfig { source: source.to_string(), target: target.to_string(), source_handle: handle.map(str::to_string) }
    }

    /// **Scenario 1 from the spec**: `A -> B`; A computes `y = x+1`, B computes
    /// `w = z*10` from `{{ A.y }}`. Expects final output `{w: 20}` and both outputs
    /// present in the checkpointed cache.
    #[tokio::test]
    async fn scenario_1_simple_linear_run() {
        let dir = tempfile::tempdir().unwrap();
        let (bus, event_store, checkpoint_store) = make_bus_and_stores(dir.path());

        let mut components: ComponentRegistry = Map::new();
        components.insert(
            "add_one".to_string(),
            Arc::new(ClosureComponent(|inputs: &Map<String, Value>| {
                let x = inputs["x"].as_i64().unwrap();
                serde_json::json!({"y": x + 1})
            })),
        );
        components.insert(
            "times_ten".to_string(),
            Arc::new(ClosureComponent(|inputs: &Map<String, Value>| {
                let z = inputs["z"].as_i64().unwrap();
                serde_json::json!({"w": z * 10})
            })),
        );

        let graph = Arc::new(
            Graph::from_definition(WorkflowDefinition {
                nodes: vec![
                    node("A", "add_one", serde_json::json!({"x": 1})),
                    node("B", "times_ten", serde_json::json!({"z": "{{ A.y }}"})),
                ],
                edges: vec![edge("A", "B", None)],
                entry: "A".to_string(),
            })
            .unwrap(),
        );

        let scheduler = Scheduler::new(components, checkpoint_store, bus, event_store, Vec::new(), 5);
        let output = scheduler
            .run(graph, serde_json::json!({}), RunOptions::default())
            .await
            .unwrap();

        assert_eq!(output, serde_json::json!({"w": 20}));
    }

    /// **Scenario 2 from the spec**: a conditional selector node routes to `T` or
    /// `F` depending on `_active_handle`; only the matching branch executes.
    #[tokio::test]
    async fn scenario_2_conditional_branch() {
        let dir = tempfile::tempdir().unwrap();

        async fn run_with_n(dir: &std::path::Path, n: i64) -> Value {
            let (bus, event_store, checkpoint_store) = make_bus_and_stores(dir);
            let mut components: ComponentRegistry = Map::new();
            components.insert(
                "check".to_string(),
                Arc::new(ClosureComponent(|inputs: &Map<String, Value>| {
                    let n = inputs["n"].as_i64().unwrap();
                    if n > 0 {
                        serde_json::json!({"_active_handle": "true"})
                    } else {
                        serde_json::json!({"_active_handle": "false"})
                    }
                })),
            );
            components.insert("mark_t".to_string(), Arc::new(ClosureComponent(|_: &Map<String, Value>| serde_json::json!({"branch": "T"}))));
            components.insert("mark_f".to_string(), Arc::new(ClosureComponent(|_: &Map<String, Value>| serde_json::json!({"branch": "F"}))));

            let graph = Arc::new(
                Graph::from_definition(WorkflowDefinition {
                    nodes: vec![
                        node("Check", "check", serde_json::json!({"n": "{{ n }}"})),
                        node("T", "mark_t", serde_json::json!({})),
                        node("F", "mark_f", serde_json::json!({})),
                    ],
                    edges: vec![edge("Check", "T", Some("true")), edge("Check", "F", Some("false"))],
                    entry: "Check".to_string(),
                })
                .unwrap(),
            );

            let scheduler = Scheduler::new(components, checkpoint_store, bus, event_store, Vec::new(), 5);
            scheduler
                .run(graph, serde_json::json!({"n": n}), RunOptions::default())
                .await
                .unwrap()
        }

        assert_eq!(run_with_n(dir.path(), 5).await, serde_json::json!({"branch": "T"}));
        assert_eq!(run_with_n(dir.path(), -1).await, serde_json::json!({"branch": "F"}));
    }

    /// **Scenario 4 from the spec**: a crash after `B` completes is simulated by
    /// running only up to `B` via `target_node`, then resuming; `C` must execute
    /// using the already-checkpointed outputs of `A` and `B` without re-running them.
    #[tokio::test]
    async fn scenario_4_crash_resume_continues_at_next_node() {
        let dir = tempfile::tempdir().unwrap();
        let (bus, event_store, checkpoint_store) = make_bus_and_stores(dir.path());

        let run_count = Arc::new(std::sync::atomic::AtomicU64::new(0));

        struct CountingComponent {
            label: &'static str,
            count: Arc<std::sync::atomic::AtomicU64>,
        }

        #[async_trait]
        impl Component for CountingComponent {
            async fn invoke(&self, _inputs: Map<String, Value>, _config: Map<String, Value>, _ctx: &ExecutionContext) -> Result<Value, ComponentError> {
                self.count.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(serde_json::json!({"ran": self.label}))
            }
        }

        let mut components: ComponentRegistry = Map::new();
        components.insert("a".to_string(), Arc::new(CountingComponent { label: "A", count: Arc::clone(&run_count) }));
        components.insert("b".to_string(), Arc::new(CountingComponent { label: "B", count: Arc::clone(&run_count) }));
        components.insert("c".to_string(), Arc::new(CountingComponent { label: "C", count: Arc::clone(&run_count) }));

        let graph = Arc::new(
            Graph::from_definition(WorkflowDefinition {
                nodes: vec![
                    node("A", "a", serde_json::json!({})),
                    node("B", "b", serde_json::json!({})),
                    node("C", "c", serde_json::json!({})),
                ],
                edges: vec![edge("A", "B", None), edge("B", "C", None)],
                entry: "A".to_string(),
            })
            .unwrap(),
        );

        let scheduler = Scheduler::new(components, Arc::clone(&checkpoint_store), Arc::clone(&bus), Arc::clone(&event_store), Vec::new(), 5);

        // Simulate a crash by stopping right after B.
        let run_id = "crash-run".to_string();
        scheduler
            .run(
                Arc::clone(&graph),
                serde_json::json!({}),
                RunOptions { run_id: Some(run_id.clone()), target_node: Some("B".to_string()), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(run_count.load(std::sync::atomic::Ordering::SeqCst), 2);

        let checkpoint = checkpoint_store.load_checkpoint(&run_id).await.unwrap().unwrap();
        assert_eq!(checkpoint.status, RunStatus::Stopped);
        // B's successor is enqueued before the debug-target stop returns, so the
        // persisted queue carries C forward for the resume to pick up.
        assert_eq!(checkpoint.execution_queue, vec!["C".to_string()]);
        let last_seq_before_resume = event_store.get_events(&run_id, 0).await.unwrap().last().unwrap().seq_id;

        let output = scheduler
            .run(graph, serde_json::json!({}), RunOptions { run_id: Some(run_id.clone()), resume: true, ..Default::default() })
            .await
            .unwrap();

        assert_eq!(output, serde_json::json!({"ran": "C"}));
        // A and B were not re-executed; only C added a third invocation.
        assert_eq!(run_count.load(std::sync::atomic::Ordering::SeqCst), 3);

        let events = event_store.get_events(&run_id, 0).await.unwrap();
        let completed = events.iter().find(|e| e.event_type == "workflow_completed").unwrap();
        assert!(completed.seq_id > last_seq_before_resume);
    }

    /// **Scenario**: a node that raises fails the run and leaves itself at the head
    /// of the checkpointed queue for a subsequent resume to retry (§8 invariant).
    #[tokio::test]
    async fn failed_node_is_requeued_for_resume() {
        let dir = tempfile::tempdir().unwrap();
        let (bus, event_store, checkpoint_store) = make_bus_and_stores(dir.path());

        struct FailingComponent;
        #[async_trait]
        impl Component for FailingComponent {
            async fn invoke(&self, _inputs: Map<String, Value>, _config: Map<String, Value>, _ctx: &ExecutionContext) -> Result<Value, ComponentError> {
                Err(ComponentError::Execution("boom".to_string()))
            }
        }

        let mut components: ComponentRegistry = Map::new();
        components.insert("boom".to_string(), Arc::new(FailingComponent));

        let graph = Arc::new(
            Graph::from_definition(WorkflowDefinition {
                nodes: vec![node("A", "boom", serde_json::json!({}))],
                edges: vec![],
                entry: "A".to_string(),
            })
            .unwrap(),
        );

        let scheduler = Scheduler::new(components, checkpoint_store.clone(), bus, event_store, Vec::new(), 5);
        let run_id = "failing-run".to_string();
        let err = scheduler
            .run(graph, serde_json::json!({}), RunOptions { run_id: Some(run_id.clone()), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::NodeFailed { .. }));

        let checkpoint = checkpoint_store.load_checkpoint(&run_id).await.unwrap().unwrap();
        assert_eq!(checkpoint.status, RunStatus::Failed);
        assert_eq!(checkpoint.execution_queue, vec!["A".to_string()]);
    }
}
