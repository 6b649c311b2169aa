//! Conversation container plus the normalization fixer pipeline (§3, §4.5).

use std::collections::HashSet;

use super::message::{Message, MessageContent, Role, Visibility};

/// An ordered sequence of messages.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn empty() -> Self {
        Self { messages: Vec::new() }
    }

    pub fn new_unvalidated(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Appends `message`, merging it into the last message when both share an id and
    /// are single plain-text content (streaming token accumulation).
    pub fn push(&mut self, message: Message) {
        if let (Some(last), Some(new_id)) = (self.messages.last_mut(), message.id.as_deref()) {
            if last.id.as_deref() == Some(new_id) {
                if let ([MessageContent::Text { text: last_text }], [MessageContent::Text { text: new_text }]) =
                    (last.content.as_mut_slice(), message.content.as_slice())
                {
                    last_text.push_str(new_text);
                    return;
                }
                last.content.extend(message.content);
                return;
            }
        }
        self.messages.push(message);
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        for message in messages {
            self.push(message);
        }
    }

    pub fn agent_visible_messages(&self) -> Vec<&Message> {
        self.messages.iter().filter(|m| m.visibility.agent_visible).collect()
    }

    pub fn user_visible_messages(&self) -> Vec<&Message> {
        self.messages.iter().filter(|m| m.visibility.user_visible).collect()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Runs the fixer pipeline and raises if any issues were found, rather than
    /// silently accepting a malformed conversation.
    pub fn validate(self) -> Result<Self, InvalidConversation> {
        let (fixed, issues) = fix_messages(self.messages);
        if issues.is_empty() {
            Ok(Self { messages: fixed })
        } else {
            Err(InvalidConversation { reason: issues.join("\n"), conversation: Self { messages: fixed } })
        }
    }
}

#[derive(Debug)]
pub struct InvalidConversation {
    pub reason: String,
    pub conversation: Conversation,
}

impl std::fmt::Display for InvalidConversation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid conversation: {}", self.reason)
    }
}

impl std::error::Error for InvalidConversation {}

/// The effective role used for consecutive-message merging: a user message that is
/// entirely tool responses behaves like a "tool" turn, not a "user" turn.
fn effective_role(message: &Message) -> Role {
    if message.role == Role::User && message.has_tool_response() {
        Role::Tool
    } else {
        message.role
    }
}

/// Normalizes `messages` while preserving the position of agent-invisible messages.
///
/// Only the agent-visible subset is run through [`fix_messages`]; invisible messages
/// are then reintegrated at their original slots, consumed queue-style so that a
/// fixer which drops or merges visible messages does not shift invisible ones.
pub fn fix_conversation(conversation: Conversation) -> (Conversation, Vec<String>) {
    enum Slot {
        Visible,
        Hidden(Message),
    }

    let mut shadow_map = Vec::with_capacity(conversation.messages.len());
    let mut visible = Vec::new();
    for message in conversation.messages {
        if message.visibility.agent_visible {
            shadow_map.push(Slot::Visible);
            visible.push(message);
        } else {
            shadow_map.push(Slot::Hidden(message));
        }
    }

    let (fixed_visible, issues) = fix_messages(visible);
    let mut visible_iter = fixed_visible.into_iter();

    let mut final_messages = Vec::with_capacity(shadow_map.len());
    for slot in shadow_map {
        match slot {
            Slot::Visible => {
                if let Some(message) = visible_iter.next() {
                    final_messages.push(message);
                }
            }
            Slot::Hidden(message) => final_messages.push(message),
        }
    }
    final_messages.extend(visible_iter);

    (Conversation { messages: final_messages }, issues)
}

/// The ordered normalization pipeline (§4.5 "Message normalization").
pub fn fix_messages(messages: Vec<Message>) -> (Vec<Message>, Vec<String>) {
    let mut current = messages;
    let mut all_issues = Vec::new();

    for fixer in [
        merge_text_content_items,
        trim_assistant_text_whitespace,
        remove_empty_messages,
        fix_tool_calling,
        merge_consecutive_messages,
        fix_lead_trail,
        populate_if_empty,
    ] {
        let (next, mut issues) = fixer(current);
        all_issues.append(&mut issues);
        current = next;
    }

    (current, all_issues)
}

fn merge_text_content_items(messages: Vec<Message>) -> (Vec<Message>, Vec<String>) {
    let mut issues = Vec::new();
    let mut out = Vec::with_capacity(messages.len());

    for mut message in messages {
        if message.role != Role::Assistant {
            out.push(message);
            continue;
        }

        let original_len = message.content.len();
        let mut merged: Vec<MessageContent> = Vec::with_capacity(message.content.len());
        for item in message.content.drain(..) {
            match (merged.last_mut(), &item) {
                (Some(MessageContent::Text { text: last }), MessageContent::Text { text: new }) => {
                    last.push_str(new);
                }
                _ => merged.push(item),
            }
        }
        if merged.len() != original_len {
            issues.push("merged adjacent text content".to_string());
        }
        message.content = merged;
        out.push(message);
    }
    (out, issues)
}

fn trim_assistant_text_whitespace(mut messages: Vec<Message>) -> (Vec<Message>, Vec<String>) {
    let mut issues = Vec::new();
    for message in &mut messages {
        if message.role != Role::Assistant {
            continue;
        }
        for item in &mut message.content {
            if let MessageContent::Text { text } = item {
                let trimmed = text.trim_end();
                if trimmed.len() != text.len() {
                    *text = trimmed.to_string();
                    issues.push("trimmed trailing assistant whitespace".to_string());
                }
            }
        }
    }
    (messages, issues)
}

fn remove_empty_messages(messages: Vec<Message>) -> (Vec<Message>, Vec<String>) {
    let mut issues = Vec::new();
    let out = messages
        .into_iter()
        .filter(|m| {
            let keep = !m.is_empty();
            if !keep {
                issues.push("removed empty message".to_string());
            }
            keep
        })
        .collect();
    (out, issues)
}

/// Drops content that breaks role conventions, then resolves orphaned tool
/// requests/responses by id in two passes (§4.5).
fn fix_tool_calling(mut messages: Vec<Message>) -> (Vec<Message>, Vec<String>) {
    let mut issues = Vec::new();
    let mut pending_requests: HashSet<String> = HashSet::new();

    for message in &mut messages {
        match message.role {
            Role::User => {
                message.content.retain(|content| match content {
                    MessageContent::ToolRequest { .. } | MessageContent::FrontendToolRequest { .. } => {
                        issues.push("removed tool request from user message".to_string());
                        false
                    }
                    MessageContent::ToolConfirmationRequest { .. } => {
                        issues.push("removed tool confirmation request from user message".to_string());
                        false
                    }
                    MessageContent::Thinking { .. } | MessageContent::RedactedThinking => {
                        issues.push("removed thinking content from user message".to_string());
                        false
                    }
                    MessageContent::ToolResponse { id, .. } => {
                        if pending_requests.remove(id) {
                            true
                        } else {
                            issues.push(format!("removed orphaned tool response {id}"));
                            false
                        }
                    }
                    _ => true,
                });
            }
            Role::Assistant => {
                message.content.retain(|content| match content {
                    MessageContent::ToolResponse { .. } => {
                        issues.push("removed tool response from assistant message".to_string());
                        false
                    }
                    MessageContent::ToolRequest { id, .. } => {
                        pending_requests.insert(id.clone());
                        true
                    }
                    _ => true,
                });
            }
            Role::System | Role::Tool => {}
        }
    }

    if !pending_requests.is_empty() {
        for message in &mut messages {
            if message.role != Role::Assistant {
                continue;
            }
            message.content.retain(|content| match content {
                MessageContent::ToolRequest { id, .. } if pending_requests.contains(id) => {
                    issues.push(format!("removed orphaned tool request {id}"));
                    false
                }
                _ => true,
            });
        }
    }

    let (messages, mut empty_issues) = remove_empty_messages(messages);
    issues.append(&mut empty_issues);
    (messages, issues)
}

fn merge_consecutive_messages(messages: Vec<Message>) -> (Vec<Message>, Vec<String>) {
    let mut issues = Vec::new();
    let mut merged: Vec<Message> = Vec::with_capacity(messages.len());

    for message in messages {
        match merged.last_mut() {
            Some(last) if effective_role(last) == effective_role(&message) => {
                let role = effective_role(&message);
                last.content.extend(message.content);
                issues.push(format!("merged consecutive {role:?} messages"));
            }
            _ => merged.push(message),
        }
    }
    (merged, issues)
}

fn fix_lead_trail(mut messages: Vec<Message>) -> (Vec<Message>, Vec<String>) {
    let mut issues = Vec::new();
    if messages.first().map(|m| m.role) == Some(Role::Assistant) {
        messages.remove(0);
        issues.push("removed leading assistant message".to_string());
    }
    if messages.last().map(|m| m.role) == Some(Role::Assistant) {
        messages.pop();
        issues.push("removed trailing assistant message".to_string());
    }
    (messages, issues)
}

fn populate_if_empty(mut messages: Vec<Message>) -> (Vec<Message>, Vec<String>) {
    let mut issues = Vec::new();
    if messages.is_empty() {
        messages.push(Message::user("Hello").with_visibility(Visibility::default()));
        issues.push("inserted placeholder user message".to_string());
    }
    (messages, issues)
}
