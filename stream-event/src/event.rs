//! Event type strings and the criticality policy that governs sync vs async persistence.
//!
//! Types are plain strings rather than a closed enum so callers can mint their own
//! event types (tool-specific progress events, custom node types) without editing
//! this crate. The well-known lifecycle markers below are the ones the scheduler
//! itself emits.

/// Event type emitted when a node begins execution.
pub const NODE_STARTED: &str = "node_started";
/// Event type emitted when a node completes execution with a non-error output.
pub const NODE_FINISHED: &str = "node_finished";
/// Event type emitted when a node's component invocation raises.
pub const NODE_ERROR: &str = "node_error";
/// Event type emitted once, when a run finishes successfully.
pub const WORKFLOW_COMPLETED: &str = "workflow_completed";
/// Event type emitted once, when a run terminates with an unrecoverable error.
pub const WORKFLOW_FAILED: &str = "workflow_failed";
/// Event type emitted for an incremental piece of streamed model output.
pub const STREAM_TOKEN: &str = "stream_token";

/// Suffixes that mark an event type as a *critical* lifecycle event (protocol_spec §4.2).
///
/// A critical event must be durably persisted before `Streamer::emit` returns;
/// all other event types are persisted fire-and-forget.
const CRITICAL_SUFFIXES: &[&str] = &[
    "_started",
    "_completed",
    "_finished",
    "_failed",
    "_succeeded",
    "_ended",
];

/// Returns true if `event_type` ends with a critical-lifecycle suffix.
pub fn is_critical(event_type: &str) -> bool {
    CRITICAL_SUFFIXES
        .iter()
        .any(|suffix| event_type.ends_with(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: well-known lifecycle event types are all critical.
    #[test]
    fn lifecycle_event_types_are_critical() {
        assert!(is_critical(NODE_STARTED));
        assert!(is_critical(NODE_FINISHED));
        assert!(is_critical(WORKFLOW_COMPLETED));
        assert!(is_critical(WORKFLOW_FAILED));
    }

    /// **Scenario**: a streaming token event is not critical.
    #[test]
    fn stream_token_is_not_critical() {
        assert!(!is_critical(STREAM_TOKEN));
    }

    /// **Scenario**: custom event types follow the same suffix rule.
    #[test]
    fn custom_event_type_suffix_rule() {
        assert!(is_critical("tool_succeeded"));
        assert!(is_critical("subrun_ended"));
        assert!(!is_critical("tool_progress"));
    }
}
