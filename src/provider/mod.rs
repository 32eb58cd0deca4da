//! Model provider trait: the model collaborator seen by the Model Invoker.
//!
//! Inference itself is out of scope; anything that can turn a
//! [`ModelRequest`] into a [`ModelResponse`] plugs in here.

pub mod scripted;

pub use scripted::ScriptedProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::tools::Tool;
use crate::types::{AgentToolCall, ContentPart, FinishReason, GenerationSettings, ModelMessage, Usage};

/// A request sent to a model provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelRequest {
    pub system_instruction: Option<String>,
    pub messages: Vec<ModelMessage>,
    pub settings: GenerationSettings,
    pub tools: Vec<ToolDefinition>,
}

/// Tool definition sent to the provider API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn from_tool(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            parameters: tool.parameters().schema.clone(),
        }
    }
}

/// Response from a provider: text and/or tool call requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub text: String,
    pub tool_calls: Vec<AgentToolCall>,
    pub usage: Usage,
    pub finish_reason: Option<FinishReason>,
}

impl ModelResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            finish_reason: Some(FinishReason::Stop),
            ..Self::default()
        }
    }

    pub fn tool_calls(calls: Vec<AgentToolCall>) -> Self {
        Self {
            tool_calls: calls,
            finish_reason: Some(FinishReason::ToolCalls),
            ..Self::default()
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Event content for this response: text first, then tool calls.
    pub fn to_parts(&self) -> Vec<ContentPart> {
        let mut parts = Vec::with_capacity(self.tool_calls.len() + 1);
        if !self.text.is_empty() {
            parts.push(ContentPart::text(self.text.clone()));
        }
        parts.extend(self.tool_calls.iter().cloned().map(ContentPart::ToolCall));
        parts
    }
}

/// Core trait implemented by model collaborators.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Perform one model call.
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, AgentError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parts_put_text_before_calls() {
        let mut response =
            ModelResponse::tool_calls(vec![AgentToolCall::new("c1", "lookup", json!({}))]);
        response.text = "checking".into();
        let parts = response.to_parts();
        assert_eq!(parts.len(), 2);
        assert!(matches!(parts[0], ContentPart::Text { .. }));
        assert!(matches!(parts[1], ContentPart::ToolCall(_)));
        assert!(ModelResponse::text("").to_parts().is_empty());
    }
}
