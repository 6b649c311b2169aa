//! Combined data source the resolver navigates: overrides merged over node outputs and variables.

use std::collections::HashMap;

use serde_json::Value;

/// Read-only view over the data a template path can navigate.
///
/// Built fresh for each `resolve_input_mapping` call from the execution context's
/// output cache and variables, plus any loop/map overrides (`item`, `index`) which
/// take priority over both.
#[derive(Debug, Clone)]
pub struct DataSource {
    /// node_id -> last output, as `serde_json::Value::Object` per node's output map.
    node_outputs: HashMap<String, Value>,
    /// Global variables (initial inputs, resume-time supplied inputs).
    variables: HashMap<String, Value>,
    /// Loop/map overrides (e.g. `item`, `index`); highest priority.
    overrides: HashMap<String, Value>,
}

impl DataSource {
    pub fn new(node_outputs: HashMap<String, Value>, variables: HashMap<String, Value>) -> Self {
        Self {
            node_outputs,
            variables,
            overrides: HashMap::new(),
        }
    }

    /// Returns a copy of this data source with the given overrides merged on top.
    pub fn with_overrides(&self, overrides: HashMap<String, Value>) -> Self {
        let mut merged = self.overrides.clone();
        merged.extend(overrides);
        Self {
            node_outputs: self.node_outputs.clone(),
            variables: self.variables.clone(),
            overrides: merged,
        }
    }

    /// Looks up the root identifier of a path: overrides, then node outputs, then variables.
    fn lookup_root(&self, ident: &str) -> Option<Value> {
        self.overrides
            .get(ident)
            .or_else(|| self.node_outputs.get(ident))
            .or_else(|| self.variables.get(ident))
            .cloned()
    }

    /// Navigates a dot-separated path (identifiers and integer indices) against this source.
    ///
    /// Returns `None` on any failed step (missing key, index out of range, non-mapping
    /// node mid-path) rather than raising — per the resolver's "never raise on missing
    /// data" contract.
    pub fn navigate(&self, path: &str) -> Option<Value> {
        let mut segments = path.split('.');
        let root = segments.next()?;
        let mut current = self.lookup_root(root)?;

        for segment in segments {
            current = navigate_step(&current, segment)?;
        }
        Some(current)
    }
}

/// Navigates one path segment against `current`: a mapping key, an integer index into
/// an array, or (when `current` is itself an object) attribute-style key access — the
/// two reduce to the same operation over `serde_json::Value`.
fn navigate_step(current: &Value, segment: &str) -> Option<Value> {
    match current {
        Value::Object(map) => map.get(segment).cloned(),
        Value::Array(items) => {
            let idx: usize = segment.parse().ok()?;
            items.get(idx).cloned()
        }
        _ => None,
    }
}
