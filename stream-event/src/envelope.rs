//! Envelope: the wire shape of one event (protocol_spec §3 / §4.2).
//!
//! An envelope is globally unique, carries a run-scoped monotonic `seq_id`,
//! a string type, an arbitrary JSON payload, an optional producer node id,
//! a timestamp, and a metadata map. `seq_id` assignment lives in the
//! streamer, not here — this crate only defines the shape and how to build it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One event envelope, ready for publish to the bus or persistence to the store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope {
    /// Globally unique event id.
    pub id: String,
    /// Run this event belongs to; also the bus topic.
    pub run_id: String,
    /// Monotonically increasing per-run sequence number, starting at 1.
    pub seq_id: u64,
    /// Event type string, e.g. `node_started`, `stream_token`, `workflow_completed`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Arbitrary event payload.
    pub payload: Value,
    /// Node id that produced this event, if any.
    pub producer_node_id: Option<String>,
    /// Wall-clock time the envelope was constructed.
    pub timestamp: DateTime<Utc>,
    /// Free-form metadata (e.g. retry count, correlation ids).
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl Envelope {
    /// Builds a new envelope. `seq_id` is assigned by the caller (the streamer's counter).
    pub fn new(
        run_id: impl Into<String>,
        seq_id: u64,
        event_type: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            run_id: run_id.into(),
            seq_id,
            event_type: event_type.into(),
            payload,
            producer_node_id: None,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Sets the producer node id.
    pub fn with_producer(mut self, node_id: impl Into<String>) -> Self {
        self.producer_node_id = Some(node_id.into());
        self
    }

    /// Merges a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// True if this envelope's type is a critical lifecycle event (see [`crate::event::is_critical`]).
    pub fn is_critical(&self) -> bool {
        crate::event::is_critical(&self.event_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: a freshly built envelope carries the given run id, seq id, and type.
    #[test]
    fn envelope_new_sets_core_fields() {
        let env = Envelope::new("run-1", 3, "node_started", serde_json::json!({"x": 1}));
        assert_eq!(env.run_id, "run-1");
        assert_eq!(env.seq_id, 3);
        assert_eq!(env.event_type, "node_started");
        assert_eq!(env.payload["x"], 1);
        assert!(env.producer_node_id.is_none());
    }

    /// **Scenario**: with_producer / with_metadata are additive builder calls.
    #[test]
    fn envelope_builder_methods() {
        let env = Envelope::new("run-1", 1, "node_finished", Value::Null)
            .with_producer("A")
            .with_metadata("attempt", serde_json::json!(1));
        assert_eq!(env.producer_node_id.as_deref(), Some("A"));
        assert_eq!(env.metadata.get("attempt"), Some(&serde_json::json!(1)));
    }

    /// **Scenario**: is_critical reflects the event type suffix rule.
    #[test]
    fn envelope_is_critical_reflects_type() {
        let critical = Envelope::new("r", 1, "workflow_completed", Value::Null);
        let noncritical = Envelope::new("r", 2, "stream_token", Value::Null);
        assert!(critical.is_critical());
        assert!(!noncritical.is_critical());
    }

    /// **Scenario**: envelope serializes with `type` as the JSON key for event_type.
    #[test]
    fn envelope_serializes_type_field_name() {
        let env = Envelope::new("r", 1, "node_started", Value::Null);
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["type"], "node_started");
    }
}
