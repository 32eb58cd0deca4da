//! Tests for the tool system and the tool invoker.

use std::sync::Arc;

use serde_json::json;

use agentrace::agent_loop::execute_tool;
use agentrace::telemetry::{SpanScope, Tracer};
use agentrace::tools::*;
use agentrace::types::AgentToolCall;

#[test]
fn parameter_builder_constructs_schema() {
    let params = AgentToolParameters::object()
        .string("query", "Search query", true)
        .number("limit", "Max results", false)
        .boolean("verbose", "Enable verbose output", false)
        .build();

    let schema = &params.schema;
    assert_eq!(schema["type"], "object");
    assert_eq!(schema["properties"]["query"]["type"], "string");
    assert_eq!(schema["properties"]["limit"]["type"], "number");
    assert_eq!(schema["required"].as_array().unwrap().len(), 1);
}

#[test]
fn empty_parameters() {
    let params = AgentToolParameters::empty();
    assert_eq!(params.schema["type"], "object");
}

#[tokio::test]
async fn agent_tool_sees_execution_context() {
    let tool = AgentTool::new(
        "whoami",
        "Report the calling agent",
        AgentToolParameters::empty(),
        |_args, ctx| async move { Ok(json!({ "agent": ctx.agent_name, "call": ctx.tool_call_id })) },
    );
    let ctx = ToolExecutionContext {
        agent_name: "planner".into(),
        tool_call_id: "c9".into(),
        ..Default::default()
    };

    let result = tool.execute(&ToolArguments::new(json!({})), &ctx).await.unwrap();
    assert_eq!(result, json!({ "agent": "planner", "call": "c9" }));
}

#[tokio::test]
async fn execute_tool_span_uses_the_declared_name() {
    let (tracer, sink) = Tracer::in_memory();
    let scope = SpanScope::new(tracer);
    let tool: Arc<dyn Tool> = Arc::new(AgentTool::new(
        "get_weather",
        "Weather lookup",
        AgentToolParameters::object().string("city", "City", true).build(),
        |args, _ctx| async move { Ok(json!({ "city": args.get_str("city")?, "temp": 21 })) },
    ));
    let call = AgentToolCall::new("c1", "get_weather", json!({"city": "Oslo"}));

    let ok = {
        let _entered = scope.enter();
        execute_tool(tool.as_ref(), &call, &ToolExecutionContext::default()).await
    };
    assert_eq!(ok.unwrap()["temp"], 21);

    let bad_call = AgentToolCall::new("c2", "get_weather", json!({}));
    let err = {
        let _entered = scope.enter();
        execute_tool(tool.as_ref(), &bad_call, &ToolExecutionContext::default()).await
    };
    assert!(err.is_err());
    assert_eq!(sink.count("execute_tool get_weather"), 2);
    assert!(sink.open_spans().is_empty());
    assert_eq!(scope.depth(), 0);
}
