//! Closure-backed agent.

use std::fmt;
use std::sync::Arc;

use super::Agent;
use crate::agent_loop::InvocationContext;
use crate::types::EventStream;

type RunFn = dyn Fn(Arc<InvocationContext>) -> EventStream + Send + Sync;

/// Agent whose events come from a caller-supplied closure.
///
/// The closure is called on the agent's first poll, inside its span; the
/// stream it returns may be finite or unbounded.
#[derive(Clone)]
pub struct FnAgent {
    name: String,
    description: String,
    sub_agents: Vec<Arc<dyn Agent>>,
    run: Arc<RunFn>,
}

impl FnAgent {
    pub fn new<F>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn(Arc<InvocationContext>) -> EventStream + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: String::new(),
            sub_agents: Vec::new(),
            run: Arc::new(run),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Declare sub-agents; the closure decides whether and how to run them.
    pub fn with_sub_agents(mut self, sub_agents: Vec<Arc<dyn Agent>>) -> Self {
        self.sub_agents = sub_agents;
        self
    }
}

impl Agent for FnAgent {
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
        (self.run)(ctx)
    }
}

impl fmt::Debug for FnAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAgent")
            .field("name", &self.name)
            .field("sub_agents", &self.sub_agents.len())
            .finish()
    }
}
