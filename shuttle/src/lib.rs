//! # shuttle
//!
//! A workflow orchestration core: a scheduler drives a directed graph of stateless
//! components, resolving each node's templated inputs against prior outputs and
//! run variables, streaming lifecycle events to subscribers, checkpointing after
//! every node so a crashed run resumes without re-executing completed work, and
//! compacting an agent's conversation history when it approaches its context
//! window.
//!
//! ## Main modules
//!
//! - [`value`]: the Value Resolver — [`value::resolve_input_mapping`],
//!   [`value::resolve_value`], [`value::DataSource`], [`value::Selector`].
//! - [`events`]: the Event Bus & Store and per-run [`events::Streamer`] —
//!   [`events::EventBus`], [`events::SqliteEventStore`].
//! - [`checkpoint`]: the Checkpoint Store — [`checkpoint::SqliteCheckpointStore`],
//!   [`checkpoint::WorkflowState`], [`checkpoint::RunStatus`].
//! - [`conversation`]: message model and the Conversation Compactor —
//!   [`conversation::Conversation`], [`conversation::fix_conversation`],
//!   [`conversation::compact_messages`].
//! - [`scheduler`]: the Workflow Scheduler — [`scheduler::Scheduler`],
//!   [`scheduler::Graph`], [`scheduler::Component`], [`scheduler::MapComponent`].
//! - [`settings`]: ambient tunables loaded from `.env`/XDG config — [`settings::Settings`].
//!
//! Key types are re-exported at crate root.

pub mod checkpoint;
pub mod conversation;
pub mod events;
pub mod scheduler;
pub mod settings;
pub mod value;

pub use checkpoint::{CheckpointError, RunStatus, SqliteCheckpointStore, WorkflowState};
pub use conversation::{
    compact_messages, estimate_tokens, fix_conversation, fix_messages, needs_compaction,
    CompactionError, Conversation, InvalidConversation, Message, MessageContent, Role, Summarizer,
    Visibility, DEFAULT_COMPACTION_THRESHOLD,
};
pub use events::{
    EventBus, EventBusError, EventStoreError, SqliteEventStore, Streamer, StreamerError,
    DEFAULT_RING_CAPACITY, DEFAULT_SUBSCRIBER_QUEUE, DEFAULT_TOPIC_TTL,
};
pub use scheduler::{
    Component, ComponentError, ComponentRegistry, EdgeConfig, ExecutionContext, Graph, GraphError,
    MapComponent, NoopResourceManager, NodeConfig, ResourceManager, RunOptions, Scheduler,
    SchedulerError, SubWorkflowExecutor, WorkflowDefinition, WorkflowHook, ACTIVE_HANDLE_KEY,
    BREAK, CONTINUE, CONTROL_SIGNAL_KEY, SUSPEND_SENTINEL, UI_TYPE_KEY,
};
pub use settings::Settings;
pub use value::{resolve_input_mapping, resolve_value, DataSource, ResolverError, Selector};
