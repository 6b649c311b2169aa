//! Conversation compaction: token-budget trigger plus the summarize-and-rewrite
//! pipeline (§4.5).

use async_trait::async_trait;
use thiserror::Error;

use super::conversation::Conversation;
use super::message::{Message, Role, Visibility};

/// Approximate characters per token, used when no exact counter is supplied.
const CHARS_PER_TOKEN: usize = 4;

/// Default trigger threshold: compact once token usage exceeds 80% of the window.
pub const DEFAULT_COMPACTION_THRESHOLD: f64 = 0.8;

const CONVERSATION_CONTINUATION_TEXT: &str = "The previous message contains a summary that was \
prepared because a context limit was reached. Do not mention that you read a summary or that \
conversation summarization occurred. Just continue the conversation naturally based on the \
summarized context.";

const TOOL_LOOP_CONTINUATION_TEXT: &str = "The previous message contains a summary that was \
prepared because a context limit was reached. Do not mention that you read a summary or that \
conversation summarization occurred. Continue calling tools as necessary to complete the task.";

const MANUAL_COMPACT_CONTINUATION_TEXT: &str = "The previous message contains a summary that was \
prepared at the user's request. Do not mention that you read a summary or that conversation \
summarization occurred. Just continue the conversation naturally based on the summarized context.";

/// Progressive tool-response removal ratios tried, in order, before giving up.
const REMOVAL_PERCENTAGES: [u32; 5] = [0, 10, 20, 50, 100];

#[derive(Debug, Error)]
pub enum CompactionError {
    #[error("summarization failed even after removing all tool responses: {0}")]
    Overflow(String),
    #[error("summarizer error: {0}")]
    Summarizer(String),
}

/// Estimates token usage for `messages` using a known counter if the caller passes
/// one in via `exact_tokens`, falling back to a chars/4 heuristic otherwise. Mirrors
/// the hybrid strategy used elsewhere in this workspace for context-window checks.
pub fn estimate_tokens(messages: &[&Message], exact_tokens: Option<u64>) -> u64 {
    if let Some(exact) = exact_tokens {
        return exact;
    }
    let chars: usize = messages
        .iter()
        .flat_map(|m| m.content.iter())
        .filter_map(|c| c.as_text())
        .map(str::len)
        .sum();
    (chars / CHARS_PER_TOKEN) as u64
}

/// Decides whether `conversation` needs compaction against `context_window` tokens.
///
/// A threshold outside the open interval (0, 1) disables the trigger entirely
/// (always false) rather than being clamped, per §4.5.
pub fn needs_compaction(
    conversation: &Conversation,
    context_window: u64,
    threshold: f64,
    exact_tokens: Option<u64>,
) -> bool {
    if !(0.0 < threshold && threshold < 1.0) {
        return false;
    }
    let visible = conversation.agent_visible_messages();
    let used = estimate_tokens(&visible, exact_tokens);
    let ratio = used as f64 / context_window.max(1) as f64;
    ratio > threshold
}

/// External summarization call. Kept as a trait rather than a concrete LLM client so
/// this crate never encodes a specific provider's wire format; callers supply their
/// own implementation over whatever provider they use.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Returns a summary of `transcript` (already formatted as role-prefixed lines),
    /// or an error if the prompt would exceed the caller's context window.
    async fn summarize(&self, transcript: &str) -> Result<String, String>;
}

/// Removes a `remove_percent` fraction of tool-response-bearing messages, middle-out:
/// starting near the median index and alternating outward. `remove_percent = 0` is a
/// no-op; this is the escalating fallback used when a summarization attempt overflows.
fn filter_tool_responses(messages: &[Message], remove_percent: u32) -> Vec<Message> {
    if remove_percent == 0 {
        return messages.to_vec();
    }

    let tool_indices: Vec<usize> = messages
        .iter()
        .enumerate()
        .filter(|(_, m)| m.has_tool_response())
        .map(|(i, _)| i)
        .collect();
    if tool_indices.is_empty() {
        return messages.to_vec();
    }

    let num_to_remove = ((tool_indices.len() as u64 * remove_percent as u64) / 100).max(1) as usize;
    let middle = tool_indices.len() / 2;
    let mut to_remove = std::collections::HashSet::new();

    for i in 0..num_to_remove {
        if i % 2 == 0 {
            let offset = i / 2;
            if middle > offset {
                to_remove.insert(tool_indices[middle - offset - 1]);
            }
        } else {
            let offset = i / 2;
            if middle + offset < tool_indices.len() {
                to_remove.insert(tool_indices[middle + offset]);
            }
        }
    }

    messages
        .iter()
        .enumerate()
        .filter(|(i, _)| !to_remove.contains(i))
        .map(|(_, m)| m.clone())
        .collect()
}

fn format_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("[{:?}]: {}", m.role, m.as_concat_text()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Runs the escalating-removal summarization attempts and returns the summary text.
async fn do_compact(
    summarizer: &dyn Summarizer,
    agent_visible: &[Message],
) -> Result<String, CompactionError> {
    let mut last_error = String::new();
    for remove_percent in REMOVAL_PERCENTAGES {
        let filtered = filter_tool_responses(agent_visible, remove_percent);
        let transcript = format_transcript(&filtered);
        match summarizer.summarize(&transcript).await {
            Ok(summary) => return Ok(summary),
            Err(err) => last_error = err,
        }
    }
    Err(CompactionError::Overflow(last_error))
}

/// True if `message` is agent-visible, user-authored, and carries only plain text
/// (no tool parts) — the candidate for preservation across a compaction.
fn is_text_only_user_message(message: &Message) -> bool {
    message.visibility.agent_visible && message.role == Role::User && message.is_text_only()
}

/// Rewrites `conversation` to fit within budget: summarizes the existing history and
/// appends a continuation turn, preserving the most recent plain-text user message
/// (unless this is a manual/user-requested compaction, which skips preservation).
pub async fn compact_messages(
    summarizer: &dyn Summarizer,
    conversation: &Conversation,
    manual_compact: bool,
) -> Result<Conversation, CompactionError> {
    let messages = &conversation.messages;

    let mut preserved: Option<(usize, &Message)> = None;
    if !manual_compact {
        for (idx, message) in messages.iter().enumerate().rev() {
            if is_text_only_user_message(message) {
                preserved = Some((idx, message));
                break;
            }
        }
    }
    let is_most_recent = matches!(preserved, Some((idx, _)) if idx == messages.len() - 1);

    let agent_visible: Vec<Message> = messages.iter().filter(|m| m.visibility.agent_visible).cloned().collect();
    let summary_text = do_compact(summarizer, &agent_visible).await?;

    let mut final_messages = Vec::with_capacity(messages.len() + 3);
    for (idx, message) in messages.iter().enumerate() {
        let mut carried = message.clone();
        carried.visibility = if is_most_recent && preserved.map(|(i, _)| i) == Some(idx) {
            Visibility::invisible()
        } else {
            Visibility { agent_visible: false, user_visible: message.visibility.user_visible }
        };
        final_messages.push(carried);
    }

    let mut summary_msg = Message::user(summary_text);
    summary_msg.visibility = Visibility::agent_only();
    final_messages.push(summary_msg);

    let continuation_text = if manual_compact {
        MANUAL_COMPACT_CONTINUATION_TEXT
    } else if is_most_recent {
        CONVERSATION_CONTINUATION_TEXT
    } else {
        TOOL_LOOP_CONTINUATION_TEXT
    };
    let mut continuation_msg = Message::assistant(continuation_text);
    continuation_msg.visibility = Visibility::agent_only();
    final_messages.push(continuation_msg);

    if let Some((_, preserved_msg)) = preserved {
        final_messages.push(Message::user(preserved_msg.as_concat_text()));
    }

    Ok(Conversation { messages: final_messages })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubSummarizer {
        text: &'static str,
    }

    #[async_trait]
    impl Summarizer for StubSummarizer {
        async fn summarize(&self, _transcript: &str) -> Result<String, String> {
            Ok(self.text.to_string())
        }
    }

    struct AlwaysOverflowSummarizer;

    #[async_trait]
    impl Summarizer for AlwaysOverflowSummarizer {
        async fn summarize(&self, _transcript: &str) -> Result<String, String> {
            Err("context limit exceeded".to_string())
        }
    }

    /// **Scenario**: a threshold outside (0,1) disables the trigger regardless of usage.
    #[test]
    fn needs_compaction_threshold_out_of_range_is_always_false() {
        let conversation = Conversation::new_unvalidated(vec![Message::user("x".repeat(1_000_000))]);
        assert!(!needs_compaction(&conversation, 100, 1.0, None));
        assert!(!needs_compaction(&conversation, 100, 0.0, None));
    }

    /// **Scenario**: usage above threshold triggers compaction.
    #[test]
    fn needs_compaction_triggers_above_threshold() {
        let conversation = Conversation::new_unvalidated(vec![Message::user("x".repeat(1000))]);
        assert!(needs_compaction(&conversation, 100, 0.5, None));
    }

    /// **Scenario**: spec scenario 5 — the last message is a plain-text user message;
    /// after compaction a fresh user message with the same text is appended last, and
    /// exactly one visible user turn carries the preserved text.
    #[tokio::test]
    async fn compaction_preserves_most_recent_user_message() {
        let conversation = Conversation::new_unvalidated(vec![
            Message::assistant("earlier turn"),
            Message::user("please keep this exact text"),
        ]);
        let summarizer = StubSummarizer { text: "summary of the conversation" };
        let compacted = compact_messages(&summarizer, &conversation, false).await.unwrap();

        let last = compacted.messages.last().unwrap();
        assert_eq!(last.as_concat_text(), "please keep this exact text");
        assert_eq!(last.role, Role::User);

        let visible_user_turns: Vec<_> = compacted
            .user_visible_messages()
            .into_iter()
            .filter(|m| m.role == Role::User)
            .collect();
        assert_eq!(visible_user_turns.len(), 1);
        assert_eq!(visible_user_turns[0].as_concat_text(), "please keep this exact text");
    }

    /// **Scenario**: manual compaction skips preservation entirely.
    #[tokio::test]
    async fn manual_compaction_does_not_preserve_a_message() {
        let conversation = Conversation::new_unvalidated(vec![Message::user("some text")]);
        let summarizer = StubSummarizer { text: "summary" };
        let compacted = compact_messages(&summarizer, &conversation, true).await.unwrap();
        assert_eq!(compacted.messages.last().unwrap().as_concat_text(), "summary");
    }

    /// **Scenario**: summarization that overflows at every removal ratio is a terminal error.
    #[tokio::test]
    async fn compaction_overflow_at_every_ratio_is_terminal() {
        let conversation = Conversation::new_unvalidated(vec![Message::user("x")]);
        let err = compact_messages(&AlwaysOverflowSummarizer, &conversation, false).await.unwrap_err();
        assert!(matches!(err, CompactionError::Overflow(_)));
    }

    /// **Scenario**: filter_tool_responses is a no-op at 0% and removes roughly the
    /// requested share middle-out otherwise.
    #[test]
    fn filter_tool_responses_removes_middle_out() {
        let messages: Vec<Message> = (0..10)
            .map(|i| Message::assistant("x").with_tool_response(format!("call-{i}"), "r"))
            .collect();
        assert_eq!(filter_tool_responses(&messages, 0).len(), 10);
        let filtered = filter_tool_responses(&messages, 50);
        assert!(filtered.len() < messages.len());
    }
}
