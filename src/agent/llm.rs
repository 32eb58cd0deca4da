//! Model-backed agent: calls the model, executes requested tools, repeats.

use std::fmt;
use std::sync::Arc;

use super::Agent;
use crate::agent_loop::{call_llm, dispatch_tool_calls, InvocationContext};
use crate::config::ToolErrorPolicy;
use crate::provider::{ModelProvider, ModelRequest, ToolDefinition};
use crate::tools::Tool;
use crate::types::{ContentPart, Event, EventStream, GenerationSettings, ModelMessage};

/// An agent driven by a [`ModelProvider`].
///
/// Each step makes one model call, counted against
/// [`RunConfig::max_llm_calls`](crate::config::RunConfig) when the call starts,
/// and yields its event. Tool calls in the response
/// are executed and their results yielded as one more event before the next
/// step; a response without tool calls ends the run.
pub struct LlmAgent {
    name: String,
    description: String,
    instruction: Option<String>,
    provider: Arc<dyn ModelProvider>,
    tools: Vec<Arc<dyn Tool>>,
    settings: GenerationSettings,
    tool_error_policy: Option<ToolErrorPolicy>,
}

impl LlmAgent {
    pub fn new(name: impl Into<String>, provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            instruction: None,
            provider,
            tools: Vec::new(),
            settings: GenerationSettings::default(),
            tool_error_policy: None,
        }
    }

    /// System instruction sent with every request.
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_tools(mut self, tools: Vec<Arc<dyn Tool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Override the invocation's tool error policy for this agent.
    pub fn with_tool_error_policy(mut self, policy: ToolErrorPolicy) -> Self {
        self.tool_error_policy = Some(policy);
        self
    }

    fn request(&self, history: &[ModelMessage], tools: &[ToolDefinition]) -> ModelRequest {
        ModelRequest {
            system_instruction: self.instruction.clone(),
            messages: history.to_vec(),
            settings: self.settings.clone(),
            tools: tools.to_vec(),
        }
    }
}

impl Agent for LlmAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    fn run_impl(self: Arc<Self>, ctx: Arc<InvocationContext>) -> EventStream {
        let stream = async_stream::stream! {
            let policy = self
                .tool_error_policy
                .unwrap_or(ctx.run_config().tool_error_policy);
            let tool_defs: Vec<ToolDefinition> = self
                .tools
                .iter()
                .map(|tool| ToolDefinition::from_tool(tool.as_ref()))
                .collect();
            let mut history: Vec<ModelMessage> =
                ctx.user_event().to_model_message().into_iter().collect();

            loop {
                if ctx.is_cancelled() {
                    tracing::debug!(agent = %self.name, "cancelled before model call");
                    return;
                }
                let request = self.request(&history, &tool_defs);
                // The step is only counted once the model call is first polled.
                let model_call = async {
                    let step = match ctx.begin_llm_call() {
                        Ok(step) => step,
                        Err(err) => return Err(err),
                    };
                    tracing::debug!(agent = %self.name, step, "llm step");
                    call_llm(self.provider.as_ref(), &request).await
                };
                let outcome = tokio::select! {
                    biased;
                    _ = ctx.cancelled() => None,
                    result = model_call => Some(result),
                };
                let Some(result) = outcome else {
                    tracing::debug!(agent = %self.name, "cancelled during model call");
                    return;
                };
                let response = match result {
                    Ok(response) => response,
                    Err(err) => {
                        yield Err(err);
                        return;
                    }
                };
                ctx.record_usage(&response.usage);

                let model_event = Event::new(ctx.invocation_id(), self.name.clone(), response.to_parts());
                history.extend(model_event.to_model_message());
                yield Ok(model_event);

                if !response.has_tool_calls() {
                    break;
                }

                let results = match dispatch_tool_calls(
                    &self.tools,
                    &response.tool_calls,
                    &ctx,
                    &self.name,
                    policy,
                )
                .await
                {
                    Ok(results) => results,
                    Err(err) => {
                        yield Err(err);
                        return;
                    }
                };
                let parts = results.into_iter().map(ContentPart::ToolResult).collect();
                let tool_event = Event::new(ctx.invocation_id(), self.name.clone(), parts);
                history.extend(tool_event.to_model_message());
                yield Ok(tool_event);
            }
        };
        Box::pin(stream)
    }
}

impl fmt::Debug for LlmAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmAgent")
            .field("name", &self.name)
            .field("model", &self.provider.model_id())
            .field("tools", &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>())
            .finish()
    }
}
