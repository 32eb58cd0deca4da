//! Tool Invoker: one tool execution inside an `execute_tool <name>` span,
//! plus dispatch of a model's tool calls under a [`ToolErrorPolicy`].

use std::sync::Arc;

use crate::config::ToolErrorPolicy;
use crate::error::{AgentError, Result};
use crate::telemetry::{names, start_current_span};
use crate::tools::{Tool, ToolArguments, ToolExecutionContext};
use crate::types::{AgentToolCall, AgentToolResult};

use super::context::InvocationContext;

/// Execute one tool call. The span closes whether the tool succeeds or not.
pub async fn execute_tool(
    tool: &dyn Tool,
    call: &AgentToolCall,
    ctx: &ToolExecutionContext,
) -> Result<serde_json::Value> {
    let _span = start_current_span(names::execute_tool(tool.name()));
    tracing::debug!(tool = tool.name(), call_id = %call.id, "execute_tool start");
    let args = ToolArguments::new(call.arguments.clone());
    tool.execute(&args, ctx).await
}

/// Run every call in order and collect their results.
///
/// Calls naming an unknown tool never reach [`execute_tool`], so they open
/// no span. Failures become `is_error` results under
/// [`ToolErrorPolicy::Report`] and abort the dispatch under
/// [`ToolErrorPolicy::Propagate`].
pub async fn dispatch_tool_calls(
    tools: &[Arc<dyn Tool>],
    calls: &[AgentToolCall],
    ctx: &InvocationContext,
    agent_name: &str,
    policy: ToolErrorPolicy,
) -> Result<Vec<AgentToolResult>> {
    let mut results = Vec::with_capacity(calls.len());
    for call in calls {
        let exec_ctx = ToolExecutionContext {
            invocation_id: ctx.invocation_id(),
            agent_name: agent_name.to_string(),
            tool_call_id: call.id.clone(),
        };
        let outcome = match tools.iter().find(|tool| tool.name() == call.name) {
            Some(tool) => execute_tool(tool.as_ref(), call, &exec_ctx).await,
            None => Err(AgentError::ToolNotFound(call.name.clone())),
        };
        let result = match (outcome, policy) {
            (Ok(value), _) => AgentToolResult {
                tool_call_id: call.id.clone(),
                result: value,
                is_error: false,
            },
            (Err(err), ToolErrorPolicy::Propagate) => return Err(err),
            (Err(err), ToolErrorPolicy::Report) => {
                tracing::warn!(
                    agent = agent_name,
                    tool = %call.name,
                    error = %err,
                    "tool failed; reporting to model"
                );
                AgentToolResult {
                    tool_call_id: call.id.clone(),
                    result: serde_json::json!({ "error": err.to_string() }),
                    is_error: true,
                }
            }
        };
        results.push(result);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::FnAgent;
    use crate::config::RunConfig;
    use crate::telemetry::{SpanScope, Tracer};
    use crate::tools::{AgentTool, AgentToolParameters};
    use crate::types::{Event, USER_AUTHOR};
    use futures::stream::{self, StreamExt};
    use serde_json::json;
    use uuid::Uuid;

    fn tools() -> Vec<Arc<dyn Tool>> {
        let echo = AgentTool::new("echo", "Echo", AgentToolParameters::empty(), |args, _ctx| async move {
            Ok(args.raw().clone())
        });
        let broken = AgentTool::new("broken", "Fails", AgentToolParameters::empty(), |_args, _ctx| async move {
            Err(AgentError::tool("broken", "exploded"))
        });
        let tools: Vec<Arc<dyn Tool>> = vec![Arc::new(echo), Arc::new(broken)];
        tools
    }

    fn context() -> InvocationContext {
        let agent = Arc::new(FnAgent::new("idle", |_ctx| stream::empty().boxed()));
        InvocationContext::new(
            "app",
            Uuid::new_v4(),
            agent,
            Event::empty(Uuid::new_v4(), USER_AUTHOR),
            RunConfig::default(),
        )
    }

    #[tokio::test]
    async fn report_policy_turns_failures_into_results() {
        let (tracer, sink) = Tracer::in_memory();
        let scope = SpanScope::new(tracer);
        let _entered = scope.enter();
        let calls = vec![
            AgentToolCall::new("c1", "echo", json!({"x": 1})),
            AgentToolCall::new("c2", "broken", json!({})),
            AgentToolCall::new("c3", "missing", json!({})),
        ];

        let results = dispatch_tool_calls(&tools(), &calls, &context(), "agent", ToolErrorPolicy::Report)
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].result, json!({"x": 1}));
        assert!(results[1].is_error);
        assert!(results[2].is_error);
        assert_eq!(
            sink.started_names(),
            vec!["execute_tool echo", "execute_tool broken"]
        );
        assert!(sink.open_spans().is_empty());
    }

    #[tokio::test]
    async fn propagate_policy_stops_at_first_failure() {
        let (tracer, sink) = Tracer::in_memory();
        let scope = SpanScope::new(tracer);
        let _entered = scope.enter();
        let calls = vec![
            AgentToolCall::new("c1", "broken", json!({})),
            AgentToolCall::new("c2", "echo", json!({})),
        ];

        let err = dispatch_tool_calls(&tools(), &calls, &context(), "agent", ToolErrorPolicy::Propagate)
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::ToolExecution { .. }));
        assert_eq!(sink.started_names(), vec!["execute_tool broken"]);
        assert!(sink.open_spans().is_empty());
    }
}
