//! Shared test helpers: scripted agents, tools and span assertions.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future;
use futures::stream::{self, StreamExt};
use serde_json::json;

use agentrace::agent::{Agent, FnAgent};
use agentrace::agent_loop::Runner;
use agentrace::error::AgentError;
use agentrace::telemetry::{InMemorySink, SpanEvent, Tracer};
use agentrace::tools::{AgentTool, AgentToolParameters, Tool};
use agentrace::types::Event;

/// A runner reporting to a fresh in-memory sink.
pub fn traced_runner(agent: Arc<dyn Agent>) -> (Runner, Arc<InMemorySink>) {
    let (tracer, sink) = Tracer::in_memory();
    (Runner::new(agent).with_tracer(tracer), sink)
}

/// Tool that returns its `text` argument.
pub fn echo_tool(name: &str) -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        name,
        "Echo the given text",
        AgentToolParameters::object().string("text", "Text to echo", false).build(),
        |args, _ctx| async move {
            Ok(json!({ "echo": args.get_str_opt("text").unwrap_or_default() }))
        },
    ))
}

/// Tool that always fails.
pub fn failing_tool(name: &str) -> Arc<dyn Tool> {
    let tool_name = name.to_string();
    Arc::new(AgentTool::new(
        name,
        "Always fails",
        AgentToolParameters::empty(),
        move |_args, _ctx| {
            let tool_name = tool_name.clone();
            async move { Err(AgentError::tool(tool_name, "backend unavailable")) }
        },
    ))
}

/// Tool whose execution never completes.
pub fn stalled_tool(name: &str) -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        name,
        "Never returns",
        AgentToolParameters::empty(),
        |_args, _ctx| future::pending::<Result<serde_json::Value, AgentError>>(),
    ))
}

/// Custom agent yielding `count` text events without touching a model.
pub fn counting_agent(name: &str, count: usize) -> Arc<dyn Agent> {
    let author = name.to_string();
    Arc::new(FnAgent::new(name, move |ctx| {
        let id = ctx.invocation_id();
        let author = author.clone();
        stream::iter((0..count).map(move |i| Ok(Event::text(id, author.clone(), format!("event {i}")))))
            .boxed()
    }))
}

pub fn counts(pairs: &[(&str, usize)]) -> BTreeMap<String, usize> {
    pairs.iter().map(|(name, n)| ((*name).to_string(), *n)).collect()
}

/// Span names in the order they ended.
pub fn ended_names(sink: &InMemorySink) -> Vec<String> {
    sink.log()
        .into_iter()
        .filter_map(|event| match event {
            SpanEvent::Ended { name, .. } => Some(name),
            SpanEvent::Started { .. } => None,
        })
        .collect()
}
