//! Conversation Compactor: message model, normalization pipeline, and token-budget
//! compaction (§3, §4.5).

mod compaction;
mod conversation;
mod message;

pub use compaction::{
    compact_messages, estimate_tokens, needs_compaction, CompactionError, Summarizer,
    DEFAULT_COMPACTION_THRESHOLD,
};
pub use conversation::{fix_conversation, fix_messages, Conversation, InvalidConversation};
pub use message::{Message, MessageContent, Role, Visibility};
