//! Per-invocation state shared with every agent in the tree.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::agent::Agent;
use crate::config::RunConfig;
use crate::error::{AgentError, Result};
use crate::telemetry::sink::lock;
use crate::types::{Event, Usage};

/// State scoped to one top-level invocation.
///
/// Created by the [`Runner`](super::Runner), handed to agents as
/// `Arc<InvocationContext>`, and dropped together with the invocation
/// stream.
pub struct InvocationContext {
    invocation_id: Uuid,
    session_id: Uuid,
    app_name: String,
    root_agent: Arc<dyn Agent>,
    user_event: Event,
    run_config: RunConfig,
    cancel: CancellationToken,
    llm_calls: AtomicUsize,
    usage: Mutex<Usage>,
}

impl InvocationContext {
    pub fn new(
        app_name: impl Into<String>,
        session_id: Uuid,
        root_agent: Arc<dyn Agent>,
        user_event: Event,
        run_config: RunConfig,
    ) -> Self {
        Self {
            invocation_id: user_event.invocation_id(),
            session_id,
            app_name: app_name.into(),
            root_agent,
            user_event,
            run_config,
            cancel: CancellationToken::new(),
            llm_calls: AtomicUsize::new(0),
            usage: Mutex::new(Usage::default()),
        }
    }

    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn root_agent(&self) -> &Arc<dyn Agent> {
        &self.root_agent
    }

    /// The caller's input, authored by `"user"`.
    pub fn user_event(&self) -> &Event {
        &self.user_event
    }

    pub fn run_config(&self) -> &RunConfig {
        &self.run_config
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Resolves once the invocation is cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// Reserve one model call against `max_llm_calls`, returning the new
    /// total. Once the limit is reached the call is refused and not counted.
    pub fn begin_llm_call(&self) -> Result<usize> {
        let limit = self.run_config.max_llm_calls;
        self.llm_calls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                (limit == 0 || count < limit).then_some(count + 1)
            })
            .map(|previous| previous + 1)
            .map_err(|_| AgentError::MaxStepsExceeded(limit))
    }

    /// Model calls started so far.
    pub fn llm_calls(&self) -> usize {
        self.llm_calls.load(Ordering::SeqCst)
    }

    pub fn record_usage(&self, usage: &Usage) {
        lock(&self.usage).merge(usage);
    }

    /// Token usage accumulated across all model calls so far.
    pub fn usage(&self) -> Usage {
        *lock(&self.usage)
    }
}

impl fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationContext")
            .field("invocation_id", &self.invocation_id)
            .field("session_id", &self.session_id)
            .field("app_name", &self.app_name)
            .field("root_agent", &self.root_agent.name())
            .field("llm_calls", &self.llm_calls())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
