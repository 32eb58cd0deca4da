//! Stream adapters that tie span lifetimes to lazily polled event streams.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};

use super::scope::{ScopedSpan, SpanScope};
use super::start_current_span;
use crate::error::AgentError;
use crate::types::{Event, EventStream};

type StreamFactory = Box<dyn FnOnce() -> EventStream + Send>;

/// Wraps an event stream in a named span.
///
/// The span opens on the first poll, before the inner stream is even built,
/// and closes exactly once: when the inner stream is exhausted, right after
/// it yields an error (before that error reaches the consumer), or when this
/// stream is dropped. The inner stream is always released before the span,
/// so spans opened inside it close first.
pub struct TracedStream {
    name: String,
    factory: Option<StreamFactory>,
    inner: Option<EventStream>,
    span: Option<ScopedSpan>,
}

impl TracedStream {
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: FnOnce() -> EventStream + Send + 'static,
    {
        Self {
            name: name.into(),
            factory: Some(Box::new(factory)),
            inner: None,
            span: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn close(&mut self) {
        self.factory = None;
        self.inner = None;
        self.span = None;
    }
}

impl Stream for TracedStream {
    type Item = Result<Event, AgentError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if let Some(factory) = this.factory.take() {
            this.span = Some(start_current_span(this.name.as_str()));
            this.inner = Some(factory());
        }
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };
        match inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(event))) => Poll::Ready(Some(Ok(event))),
            Poll::Ready(Some(Err(err))) => {
                this.close();
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.close();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for TracedStream {
    fn drop(&mut self) {
        self.close();
    }
}

/// Makes a [`SpanScope`] ambient for every poll of the wrapped stream, and
/// while the wrapped stream is dropped.
pub struct ScopedStream<S> {
    scope: SpanScope,
    inner: Option<S>,
}

impl<S> ScopedStream<S> {
    pub fn new(scope: SpanScope, inner: S) -> Self {
        Self {
            scope,
            inner: Some(inner),
        }
    }

    pub fn scope(&self) -> &SpanScope {
        &self.scope
    }

    /// Drop the inner stream now, closing whatever spans it still holds.
    pub fn release(&mut self) {
        let _entered = self.scope.enter();
        self.inner = None;
    }

    pub fn is_released(&self) -> bool {
        self.inner.is_none()
    }
}

impl<S> Stream for ScopedStream<S>
where
    S: Stream + Unpin,
{
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let _entered = this.scope.enter();
        match this.inner.as_mut() {
            Some(inner) => inner.poll_next_unpin(cx),
            None => Poll::Ready(None),
        }
    }
}

impl<S> Drop for ScopedStream<S> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{SpanEvent, Tracer};
    use futures::stream;
    use uuid::Uuid;

    fn events(count: usize) -> EventStream {
        let id = Uuid::new_v4();
        stream::iter((0..count).map(move |_| Ok(Event::empty(id, "test")))).boxed()
    }

    #[tokio::test]
    async fn span_opens_lazily_and_closes_on_exhaustion() {
        let (tracer, sink) = Tracer::in_memory();
        let traced = TracedStream::new("outer", || events(3));
        let mut scoped = ScopedStream::new(SpanScope::new(tracer), traced);
        assert!(sink.spans().is_empty());

        let mut seen = 0;
        while let Some(item) = scoped.next().await {
            item.unwrap();
            seen += 1;
        }
        assert_eq!(seen, 3);
        assert_eq!(sink.started_names(), vec!["outer"]);
        assert!(sink.open_spans().is_empty());
    }

    #[tokio::test]
    async fn error_closes_span_before_it_is_delivered() {
        let (tracer, sink) = Tracer::in_memory();
        let traced = TracedStream::new("failing", || {
            stream::iter(vec![Err(AgentError::agent("a", "boom"))]).boxed()
        });
        let mut scoped = ScopedStream::new(SpanScope::new(tracer), traced);

        let first = scoped.next().await.expect("error item");
        assert!(first.is_err());
        assert!(sink.open_spans().is_empty());
        assert!(scoped.next().await.is_none());
        assert_eq!(sink.count("failing"), 1);
    }

    #[tokio::test]
    async fn dropping_closes_nested_spans_innermost_first() {
        let (tracer, sink) = Tracer::in_memory();
        let traced = TracedStream::new("outer", || {
            TracedStream::new("inner", || {
                stream::pending::<Result<Event, AgentError>>().boxed()
            })
            .boxed()
        });
        let mut scoped = ScopedStream::new(SpanScope::new(tracer), traced);

        let poll = futures::poll!(scoped.next());
        assert!(poll.is_pending());
        assert_eq!(sink.open_spans().len(), 2);
        drop(scoped);

        let ends: Vec<String> = sink
            .log()
            .into_iter()
            .filter_map(|event| match event {
                SpanEvent::Ended { name, .. } => Some(name),
                SpanEvent::Started { .. } => None,
            })
            .collect();
        assert_eq!(ends, vec!["inner", "outer"]);
    }

    #[tokio::test]
    async fn never_polled_stream_opens_nothing() {
        let (tracer, sink) = Tracer::in_memory();
        let traced = TracedStream::new("idle", || events(1));
        drop(ScopedStream::new(SpanScope::new(tracer), traced));
        assert!(sink.spans().is_empty());
    }
}
