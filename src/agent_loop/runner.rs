//! Invocation Runner: entry point that turns user input into a traced,
//! lazily pulled event stream.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt, TryStreamExt};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use uuid::Uuid;

use crate::agent::{run_agent, Agent};
use crate::config::{AgentraceConfig, RunConfig};
use crate::error::Result;
use crate::telemetry::{names, ScopedStream, SpanScope, TracedStream, Tracer};
use crate::types::{Event, USER_AUTHOR};

use super::context::InvocationContext;
use super::types::{InvocationResult, InvocationStatus};

const DEFAULT_APP_NAME: &str = "agentrace";

/// Runs a root agent, one invocation per call.
///
/// Each invocation gets its own [`SpanScope`], so a single runner can drive
/// many invocations concurrently without mixing their span trees.
#[derive(Clone)]
pub struct Runner {
    app_name: String,
    root_agent: Arc<dyn Agent>,
    tracer: Option<Tracer>,
    run_config: RunConfig,
}

impl Runner {
    /// A runner using the process-wide tracer and run config.
    pub fn new(root_agent: Arc<dyn Agent>) -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            root_agent,
            tracer: None,
            run_config: AgentraceConfig::global().run.clone(),
        }
    }

    /// Report spans to `tracer` instead of [`Tracer::global`].
    pub fn with_tracer(mut self, tracer: Tracer) -> Self {
        self.tracer = Some(tracer);
        self
    }

    pub fn with_config(mut self, run_config: RunConfig) -> Self {
        self.run_config = run_config;
        self
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn root_agent(&self) -> &Arc<dyn Agent> {
        &self.root_agent
    }

    pub fn run_config(&self) -> &RunConfig {
        &self.run_config
    }

    /// Start an invocation in a fresh session.
    ///
    /// Nothing runs and no span opens until the returned stream is polled.
    pub fn run_async_with_new_session(&self, input: &str) -> InvocationStream {
        let session_id = Uuid::new_v4();
        let invocation_id = Uuid::new_v4();
        let user_event = if input.is_empty() {
            Event::empty(invocation_id, USER_AUTHOR)
        } else {
            Event::text(invocation_id, USER_AUTHOR, input)
        };
        let ctx = Arc::new(InvocationContext::new(
            self.app_name.clone(),
            session_id,
            self.root_agent.clone(),
            user_event,
            self.run_config.clone(),
        ));
        let tracer = self
            .tracer
            .clone()
            .unwrap_or_else(|| Tracer::global().clone());

        tracing::debug!(
            app = %self.app_name,
            agent = self.root_agent.name(),
            %invocation_id,
            %session_id,
            "invocation created"
        );

        let root = self.root_agent.clone();
        let agent_ctx = ctx.clone();
        let traced = TracedStream::new(names::INVOCATION, move || run_agent(root, agent_ctx));
        InvocationStream::new(ctx, ScopedStream::new(SpanScope::new(tracer), traced))
    }

    /// Run an invocation to completion and collect its events.
    pub async fn run_with_new_session(&self, input: &str) -> Result<Vec<Event>> {
        self.run_async_with_new_session(input).try_collect().await
    }
}

/// Events of one invocation, in order.
///
/// Dropping the stream early abandons the invocation; every span still open
/// closes during the drop, innermost first. After [`cancel`](Self::cancel)
/// the next poll does the same and ends the stream.
pub struct InvocationStream {
    inner: ScopedStream<TracedStream>,
    ctx: Arc<InvocationContext>,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
    status: InvocationStatus,
    events: usize,
    error: Option<String>,
}

impl InvocationStream {
    fn new(ctx: Arc<InvocationContext>, inner: ScopedStream<TracedStream>) -> Self {
        let cancelled = Box::pin(ctx.cancellation_token().cancelled_owned());
        Self {
            inner,
            ctx,
            cancelled,
            status: InvocationStatus::Running,
            events: 0,
            error: None,
        }
    }

    pub fn invocation_id(&self) -> Uuid {
        self.ctx.invocation_id()
    }

    pub fn session_id(&self) -> Uuid {
        self.ctx.session_id()
    }

    pub fn context(&self) -> &Arc<InvocationContext> {
        &self.ctx
    }

    /// Request cancellation. Also wakes a consumer waiting on the stream.
    pub fn cancel(&self) {
        self.ctx.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.ctx.cancellation_token()
    }

    pub fn status(&self) -> InvocationStatus {
        self.status
    }

    /// Number of events delivered so far.
    pub fn events_delivered(&self) -> usize {
        self.events
    }

    pub fn result(&self) -> InvocationResult {
        InvocationResult::new(self.status, self.events, self.error.clone())
    }

    fn finish(&mut self, status: InvocationStatus) {
        self.status = status;
        tracing::debug!(
            invocation_id = %self.ctx.invocation_id(),
            %status,
            events = self.events,
            llm_calls = self.ctx.llm_calls(),
            "invocation finished"
        );
    }
}

impl Stream for InvocationStream {
    type Item = Result<Event>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.status.is_terminal() {
            return Poll::Ready(None);
        }
        if this.cancelled.as_mut().poll(cx).is_ready() {
            this.inner.release();
            this.finish(InvocationStatus::Cancelled);
            return Poll::Ready(None);
        }
        match this.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(event))) => {
                this.events += 1;
                Poll::Ready(Some(Ok(event)))
            }
            Poll::Ready(Some(Err(err))) => {
                this.error = Some(err.to_string());
                this.finish(InvocationStatus::Failed);
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                let status = if this.ctx.is_cancelled() {
                    InvocationStatus::Cancelled
                } else {
                    InvocationStatus::Completed
                };
                this.finish(status);
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for InvocationStream {
    fn drop(&mut self) {
        if !self.status.is_terminal() {
            self.inner.release();
            self.finish(InvocationStatus::Abandoned);
        }
    }
}

impl std::fmt::Debug for InvocationStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationStream")
            .field("invocation_id", &self.ctx.invocation_id())
            .field("status", &self.status)
            .field("events", &self.events)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::FnAgent;
    use crate::error::AgentError;
    use futures::stream;
    use pretty_assertions::assert_eq;

    fn counting_agent(count: usize) -> Arc<dyn Agent> {
        Arc::new(FnAgent::new("counter", move |ctx| {
            let id = ctx.invocation_id();
            stream::iter((0..count).map(move |i| Ok(Event::text(id, "counter", i.to_string())))).boxed()
        }))
    }

    #[tokio::test]
    async fn stream_is_lazy_and_completes() {
        let (tracer, sink) = Tracer::in_memory();
        let runner = Runner::new(counting_agent(2)).with_tracer(tracer);

        let mut events = runner.run_async_with_new_session("hi");
        assert!(sink.spans().is_empty());
        assert_eq!(events.status(), InvocationStatus::Running);

        let first = events.next().await.unwrap().unwrap();
        assert_eq!(first.invocation_id(), events.invocation_id());
        assert!(events.next().await.is_some());
        assert!(events.next().await.is_none());
        assert_eq!(events.status(), InvocationStatus::Completed);
        assert_eq!(events.events_delivered(), 2);
        let result = events.result();
        assert_eq!(result.status, InvocationStatus::Completed);
        assert_eq!(result.events, 2);
        assert_eq!(result.error, None);
        assert_eq!(
            sink.started_names(),
            vec!["invocation", "agent_run [counter]"]
        );
        assert!(sink.open_spans().is_empty());
    }

    #[tokio::test]
    async fn user_input_is_recorded_but_not_yielded() {
        let (tracer, _sink) = Tracer::in_memory();
        let runner = Runner::new(counting_agent(0)).with_tracer(tracer);
        let events = runner.run_async_with_new_session("question");
        assert_eq!(events.context().user_event().text_content(), "question");
        assert_eq!(events.context().user_event().author(), USER_AUTHOR);

        let collected: Vec<_> = events.collect().await;
        assert!(collected.is_empty());
    }

    #[tokio::test]
    async fn failed_invocation_result_carries_the_error() {
        let (tracer, _sink) = Tracer::in_memory();
        let agent: Arc<dyn Agent> = Arc::new(FnAgent::new("broken", |ctx| {
            let id = ctx.invocation_id();
            stream::iter(vec![
                Ok(Event::text(id, "broken", "partial")),
                Err(AgentError::Configuration("no model".into())),
            ])
            .boxed()
        }));
        let runner = Runner::new(agent).with_tracer(tracer);
        let mut events = runner.run_async_with_new_session("go");

        assert!(events.next().await.unwrap().is_ok());
        assert!(events.next().await.unwrap().is_err());
        assert!(events.next().await.is_none());

        let result = events.result();
        assert_eq!(result.status, InvocationStatus::Failed);
        assert_eq!(result.events, 1);
        assert_eq!(result.error.as_deref(), Some("Configuration error: no model"));
    }

    #[tokio::test]
    async fn cancel_wakes_pending_consumer_and_closes_spans() {
        let (tracer, sink) = Tracer::in_memory();
        let agent: Arc<dyn Agent> = Arc::new(FnAgent::new("stuck", |_ctx| {
            stream::pending::<Result<Event>>().boxed()
        }));
        let runner = Runner::new(agent).with_tracer(tracer);
        let mut events = runner.run_async_with_new_session("");
        let token = events.cancellation_token();

        let canceller = tokio::spawn(async move {
            tokio::task::yield_now().await;
            token.cancel();
        });
        assert!(events.next().await.is_none());
        canceller.await.unwrap();

        assert_eq!(events.status(), InvocationStatus::Cancelled);
        assert_eq!(sink.count("invocation"), 1);
        assert!(sink.open_spans().is_empty());
    }
}
