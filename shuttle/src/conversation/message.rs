//! Message and content-part model (§3 "Conversation", §1.2 richer `MessageContent` union).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message's conversational role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One content part of a message. The union is wider than a minimal text/image/tool
/// sketch because the tool-calling fixer needs to distinguish a user-facing
/// confirmation prompt from a frontend tool call from a plain tool request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MessageContent {
    Text { text: String },
    Image { data: String, mime_type: String },
    /// A tool's raw return value, prior to being wrapped in a `ToolResponse`.
    Raw { text: Option<String>, data: Option<String> },
    ToolRequest { id: String, tool_name: String, arguments: Value },
    ToolResponse { id: String, content: Vec<MessageContent>, is_error: bool },
    FrontendToolRequest { id: String, tool_name: String, arguments: Value },
    ToolConfirmationRequest { id: String, tool_call_id: String, tool_name: String },
    ActionRequired { tool_name: Option<String>, tool_call_id: Option<String>, message: Option<String> },
    Thinking { thinking: String, signature: Option<String> },
    RedactedThinking,
    SystemNotification { notification_type: String, message: String },
}

impl MessageContent {
    pub fn text(text: impl Into<String>) -> Self {
        MessageContent::Text { text: text.into() }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, MessageContent::Text { .. })
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn is_tool_request(&self) -> bool {
        matches!(
            self,
            MessageContent::ToolRequest { .. } | MessageContent::FrontendToolRequest { .. }
        )
    }

    pub fn is_tool_response(&self) -> bool {
        matches!(self, MessageContent::ToolResponse { .. })
    }

    pub fn is_thinking(&self) -> bool {
        matches!(
            self,
            MessageContent::Thinking { .. } | MessageContent::RedactedThinking
        )
    }

    /// The request id this content part carries, if it is a request or response kind.
    pub fn correlation_id(&self) -> Option<&str> {
        match self {
            MessageContent::ToolRequest { id, .. }
            | MessageContent::FrontendToolRequest { id, .. }
            | MessageContent::ToolResponse { id, .. } => Some(id),
            _ => None,
        }
    }
}

/// Visibility flags controlling who sees a message: the agent's own context window,
/// or a human-facing transcript. Independent of each other (§4.5 compaction marks a
/// preserved message fully invisible by clearing both).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
    pub agent_visible: bool,
    pub user_visible: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self { agent_visible: true, user_visible: true }
    }
}

impl Visibility {
    pub fn invisible() -> Self {
        Self { agent_visible: false, user_visible: false }
    }

    pub fn agent_only() -> Self {
        Self { agent_visible: true, user_visible: false }
    }

    pub fn user_only() -> Self {
        Self { agent_visible: false, user_visible: true }
    }
}

/// One turn in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Option<String>,
    pub role: Role,
    pub content: Vec<MessageContent>,
    #[serde(default)]
    pub visibility: Visibility,
}

impl Message {
    fn new(role: Role) -> Self {
        Self { id: None, role, content: Vec::new(), visibility: Visibility::default() }
    }

    pub fn system(text: impl Into<String>) -> Self {
        let mut m = Self::new(Role::System);
        m.content.push(MessageContent::text(text));
        m
    }

    pub fn user(text: impl Into<String>) -> Self {
        let mut m = Self::new(Role::User);
        m.content.push(MessageContent::text(text));
        m
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        let mut m = Self::new(Role::Assistant);
        m.content.push(MessageContent::text(text));
        m
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.content.push(MessageContent::text(text));
        self
    }

    pub fn with_tool_request(mut self, id: impl Into<String>, tool_name: impl Into<String>, arguments: Value) -> Self {
        self.content.push(MessageContent::ToolRequest {
            id: id.into(),
            tool_name: tool_name.into(),
            arguments,
        });
        self
    }

    pub fn with_tool_response(mut self, id: impl Into<String>, output: impl Into<String>) -> Self {
        self.content.push(MessageContent::ToolResponse {
            id: id.into(),
            content: vec![MessageContent::text(output)],
            is_error: false,
        });
        self
    }

    /// True if this message has no content at all, or only empty text content.
    pub fn is_empty(&self) -> bool {
        self.content.iter().all(|c| matches!(c, MessageContent::Text { text } if text.trim().is_empty()))
    }

    /// Concatenates all text content parts with newlines, ignoring non-text parts.
    pub fn as_concat_text(&self) -> String {
        self.content
            .iter()
            .filter_map(MessageContent::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// True if every content part is text (i.e. no tool call/response parts at all).
    pub fn is_text_only(&self) -> bool {
        !self.content.is_empty() && self.content.iter().all(MessageContent::is_text)
    }

    pub fn has_tool_response(&self) -> bool {
        self.content.iter().any(MessageContent::is_tool_response)
    }
}
