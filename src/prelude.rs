//! Convenience re-exports for common use.

pub use crate::agent::{run_agent, Agent, FnAgent, LlmAgent, SequentialAgent};
pub use crate::agent_loop::{InvocationContext, InvocationStatus, InvocationStream, Runner};
pub use crate::config::{AgentraceConfig, RunConfig, ToolErrorPolicy};
pub use crate::error::{AgentError, Result};
pub use crate::provider::{ModelProvider, ModelRequest, ModelResponse, ScriptedProvider};
pub use crate::telemetry::{start_current_span, InMemorySink, SpanSink, Tracer};
pub use crate::tools::{AgentTool, AgentToolParameters, Tool, ToolArguments};
pub use crate::types::{ContentPart, Event, EventStream, GenerationSettings, ModelMessage, Role, Usage};
