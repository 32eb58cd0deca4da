//! Composite agent that runs its sub-agents one after another.

use std::sync::Arc;

use futures::StreamExt;

use super::{run_agent, Agent};
use crate::agent_loop::InvocationContext;
use crate::types::EventStream;

/// Runs each sub-agent in order, forwarding their events.
///
/// Every sub-agent goes through [`run_agent`], so its `agent_run` span nests
/// under this agent's. The first error ends the run; so does cancellation,
/// checked between sub-agents.
pub struct SequentialAgent {
    name: String,
    description: String,
    sub_agents: Vec<Arc<dyn Agent>>,
}

impl SequentialAgent {
    pub fn new(name: impl Into<String>, sub_agents: Vec<Arc<dyn Agent>>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            sub_agents,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl Agent for SequentialAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn sub_agents(&self) -> &[Arc<dyn Agent>] {
        &self.sub_agents
    }

    fn run_impl(self: Arc<Self>, ctx: Arc<InvocationContext>) -> EventStream {
        let stream = async_stream::stream! {
            for sub_agent in &self.sub_agents {
                if ctx.is_cancelled() {
                    tracing::debug!(agent = %self.name, "cancelled between sub-agents");
                    return;
                }
                let mut events = run_agent(sub_agent.clone(), ctx.clone());
                while let Some(item) = events.next().await {
                    match item {
                        Ok(event) => {
                            yield Ok(event);
                        }
                        Err(err) => {
                            yield Err(err);
                            return;
                        }
                    }
                }
            }
        };
        Box::pin(stream)
    }
}

impl std::fmt::Debug for SequentialAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequentialAgent")
            .field("name", &self.name)
            .field("sub_agents", &self.sub_agents.len())
            .finish()
    }
}
