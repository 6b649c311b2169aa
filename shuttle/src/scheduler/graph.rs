//! Graph model and the external-format types an adapter layer would translate into it
//! (§3 "Graph", §6 "Graph ingestion").

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("edge references unknown node: {0}")]
    UnknownNode(String),
    #[error("entry node {0:?} does not exist in the graph")]
    MissingEntry(String),
    #[error("node {0:?} has two outgoing edges with the same source_handle {1:?}")]
    DuplicateHandle(String, String),
}

/// External-format node, as an adapter layer would emit it from an editor document.
/// The core does not implement that adapter; this is the shape it would consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub id: String,
    pub component_type: String,
    #[serde(default)]
    pub config: HashMap<String, Value>,
    /// Argument name -> template value (resolved by the Value Resolver per node).
    #[serde(default = "default_input_mapping")]
    pub input_mapping: Value,
}

fn default_input_mapping() -> Value {
    Value::Object(Default::default())
}

/// External-format edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeConfig {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub source_handle: Option<String>,
}

/// External-format workflow document (§6): what a graph-editor adapter would produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub nodes: Vec<NodeConfig>,
    pub edges: Vec<EdgeConfig>,
    pub entry: String,
}

/// Validated, indexed graph ready for execution.
#[derive(Debug)]
pub struct Graph {
    nodes: HashMap<String, NodeConfig>,
    edges_by_source: HashMap<String, Vec<EdgeConfig>>,
    entry: String,
}

impl Graph {
    /// Builds and validates a `Graph` from its external representation.
    ///
    /// Invariants enforced (§3): every edge references existing nodes; the entry node
    /// exists; handle values used on edges are disjoint per source node.
    pub fn from_definition(def: WorkflowDefinition) -> Result<Self, GraphError> {
        let nodes: HashMap<String, NodeConfig> =
            def.nodes.into_iter().map(|n| (n.id.clone(), n)).collect();

        if !nodes.contains_key(&def.entry) {
            return Err(GraphError::MissingEntry(def.entry));
        }

        let mut edges_by_source: HashMap<String, Vec<EdgeConfig>> = HashMap::new();
        for edge in def.edges {
            if !nodes.contains_key(&edge.source) {
                return Err(GraphError::UnknownNode(edge.source));
            }
            if !nodes.contains_key(&edge.target) {
                return Err(GraphError::UnknownNode(edge.target));
            }
            edges_by_source.entry(edge.source.clone()).or_default().push(edge);
        }

        for (source, edges) in &edges_by_source {
            let mut seen: HashSet<&str> = HashSet::new();
            for edge in edges {
                if let Some(handle) = edge.source_handle.as_deref() {
                    if !seen.insert(handle) {
                        return Err(GraphError::DuplicateHandle(source.clone(), handle.to_string()));
                    }
                }
            }
        }

        Ok(Self { nodes, edges_by_source, entry: def.entry })
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn node(&self, id: &str) -> Option<&NodeConfig> {
        self.nodes.get(id)
    }

    pub fn outgoing(&self, id: &str) -> &[EdgeConfig] {
        self.edges_by_source.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}
