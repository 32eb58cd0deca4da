//! Model Invoker: exactly one model call inside a `call_llm` span.

use crate::error::Result;
use crate::provider::{ModelProvider, ModelRequest, ModelResponse};
use crate::telemetry::{names, start_current_span};

/// Call the model once.
///
/// The span opens before the provider is called and closes after it
/// returns or fails; errors pass through untouched.
pub async fn call_llm(provider: &dyn ModelProvider, request: &ModelRequest) -> Result<ModelResponse> {
    let _span = start_current_span(names::CALL_LLM);
    tracing::debug!(
        model = provider.model_id(),
        messages = request.messages.len(),
        tools = request.tools.len(),
        "call_llm start"
    );
    let result = provider.generate(request).await;
    match &result {
        Ok(response) => tracing::debug!(
            model = provider.model_id(),
            tool_calls = response.tool_calls.len(),
            text_len = response.text.len(),
            "call_llm complete"
        ),
        Err(err) => tracing::debug!(model = provider.model_id(), error = %err, "call_llm failed"),
    }
    result
}
