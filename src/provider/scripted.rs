//! In-process provider that replays queued responses.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ModelProvider, ModelRequest, ModelResponse};
use crate::error::AgentError;
use crate::telemetry::sink::lock;
use crate::types::{AgentToolCall, Usage};

enum Reply {
    Response(ModelResponse),
    Error(String),
}

/// Replays queued responses in order, one per call.
///
/// Every call yields to the scheduler once before answering, so callers see
/// a real suspension point. Calling past the end of the queue is an error.
pub struct ScriptedProvider {
    model_id: String,
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ModelRequest>>,
    next_call_id: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            next_call_id: AtomicUsize::new(1),
        }
    }

    pub fn queue_response(&self, response: ModelResponse) -> &Self {
        lock(&self.replies).push_back(Reply::Response(response));
        self
    }

    pub fn queue_text(&self, text: &str) -> &Self {
        self.queue_response(ModelResponse::text(text).with_usage(Usage::new(10, 20)))
    }

    /// Queue a single tool call; its call id is generated.
    pub fn queue_tool_call(&self, name: &str, args: serde_json::Value) -> &Self {
        let id = format!("call-{}", self.next_call_id.fetch_add(1, Ordering::Relaxed));
        let call = AgentToolCall::new(id, name, args);
        self.queue_response(ModelResponse::tool_calls(vec![call]).with_usage(Usage::new(10, 5)))
    }

    pub fn queue_error(&self, message: &str) -> &Self {
        lock(&self.replies).push_back(Reply::Error(message.to_string()));
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<ModelRequest> {
        lock(&self.requests).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    pub fn remaining(&self) -> usize {
        lock(&self.replies).len()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, AgentError> {
        lock(&self.requests).push(request.clone());
        tokio::task::yield_now().await;
        let reply = lock(&self.replies).pop_front();
        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Error(message)) => Err(AgentError::model(&self.model_id, message)),
            None => Err(AgentError::model(&self.model_id, "no scripted response left")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn replays_in_order_then_fails() {
        let provider = ScriptedProvider::new("scripted");
        provider
            .queue_tool_call("lookup", json!({"q": 1}))
            .queue_text("done");

        let request = ModelRequest::default();
        let first = provider.generate(&request).await.unwrap();
        assert_eq!(first.tool_calls[0].id, "call-1");
        assert_eq!(provider.generate(&request).await.unwrap().text, "done");
        assert!(provider.generate(&request).await.is_err());
        assert_eq!(provider.call_count(), 3);
    }
}
