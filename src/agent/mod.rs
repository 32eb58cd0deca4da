//! Agent Executor: the agent trait and the wrapper that traces every run.

pub mod custom;
pub mod llm;
pub mod sequential;

pub use custom::FnAgent;
pub use llm::LlmAgent;
pub use sequential::SequentialAgent;

use std::sync::Arc;

use futures::StreamExt;

use crate::agent_loop::InvocationContext;
use crate::telemetry::{names, TracedStream};
use crate::tools::Tool;
use crate::types::EventStream;

/// A unit of agent behavior producing a lazy stream of events.
///
/// Implementations only supply [`run_impl`](Agent::run_impl); callers go
/// through [`run_agent`], which adds the `agent_run [<name>]` span.
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Tools this agent may call.
    fn tools(&self) -> &[Arc<dyn Tool>] {
        &[]
    }

    fn sub_agents(&self) -> &[Arc<dyn Agent>] {
        &[]
    }

    /// Produce this agent's events. Must not do any work before it is polled.
    fn run_impl(self: Arc<Self>, ctx: Arc<InvocationContext>) -> EventStream;
}

/// Run `agent` inside an `agent_run [<name>]` span.
///
/// The span opens on the first poll and closes when the agent's stream ends,
/// fails, or is dropped.
pub fn run_agent(agent: Arc<dyn Agent>, ctx: Arc<InvocationContext>) -> EventStream {
    TracedStream::new(names::agent_run(agent.name()), move || {
        tracing::debug!(
            agent = agent.name(),
            invocation_id = %ctx.invocation_id(),
            "agent_run start"
        );
        agent.run_impl(ctx)
    })
    .boxed()
}
