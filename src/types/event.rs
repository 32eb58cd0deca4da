//! Events: the immutable unit of agent output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::{collect_text, AgentToolCall, AgentToolResult, ContentPart, ModelMessage, Role};

/// Author used for events that carry the caller's input.
pub const USER_AUTHOR: &str = "user";

/// One unit of observable agent output.
///
/// Fields are private; an event cannot change after it is built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    id: Uuid,
    invocation_id: Uuid,
    author: String,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    content: Vec<ContentPart>,
}

impl Event {
    pub fn new(invocation_id: Uuid, author: impl Into<String>, content: Vec<ContentPart>) -> Self {
        Self {
            id: Uuid::new_v4(),
            invocation_id,
            author: author.into(),
            timestamp: Utc::now(),
            content,
        }
    }

    /// An event with no content, e.g. a progress marker.
    pub fn empty(invocation_id: Uuid, author: impl Into<String>) -> Self {
        Self::new(invocation_id, author, Vec::new())
    }

    pub fn text(invocation_id: Uuid, author: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(invocation_id, author, vec![ContentPart::text(text)])
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn content(&self) -> &[ContentPart] {
        &self.content
    }

    /// Concatenated text parts.
    pub fn text_content(&self) -> String {
        collect_text(&self.content)
    }

    pub fn function_calls(&self) -> Vec<&AgentToolCall> {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::ToolCall(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    pub fn function_responses(&self) -> Vec<&AgentToolResult> {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::ToolResult(result) => Some(result),
                _ => None,
            })
            .collect()
    }

    /// True when the event neither requests a tool nor carries tool output.
    pub fn is_final_response(&self) -> bool {
        self.content
            .iter()
            .all(|part| !matches!(part, ContentPart::ToolCall(_) | ContentPart::ToolResult(_)))
    }

    /// Convert into a history message for the next model call.
    ///
    /// Events without content have no history representation.
    pub fn to_model_message(&self) -> Option<ModelMessage> {
        if self.content.is_empty() {
            return None;
        }
        let role = if !self.function_responses().is_empty() {
            Role::Tool
        } else if self.author == USER_AUTHOR {
            Role::User
        } else {
            Role::Assistant
        };
        let mut message = ModelMessage::with_parts(role, self.content.clone());
        message.timestamp = Some(self.timestamp);
        Some(message)
    }
}
