//! Span management for the execution pipeline.
//!
//! [`start_current_span`] is the single entry point used by the runner, the
//! agent wrapper and the model/tool invokers. It opens a span as a child of
//! whatever span is innermost in the ambient [`SpanScope`] and returns a
//! [`ScopedSpan`] guard that closes it on every exit path.
//!
//! The ambient scope is per thread and only installed while a
//! [`ScopedStream`] is being polled, so each invocation keeps its own
//! active-span stack even when many invocations share a runtime.

pub mod names;
pub mod scope;
pub mod sink;
pub mod stream;

pub use scope::{ScopeGuard, ScopedSpan, SpanScope};
pub use sink::{InMemorySink, NoopSink, SpanEvent, SpanId, SpanRecord, SpanSink, TracingSink};
pub use stream::{ScopedStream, TracedStream};

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::config::{AgentraceConfig, SinkKind, TelemetryConfig};
use crate::error::{AgentError, Result};

static GLOBAL_TRACER: OnceLock<Tracer> = OnceLock::new();

/// Handle to a span sink. Cheap to clone.
#[derive(Clone)]
pub struct Tracer {
    sink: Arc<dyn SpanSink>,
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer").field("sink", &"..").finish()
    }
}

impl Tracer {
    pub fn new(sink: Arc<dyn SpanSink>) -> Self {
        Self { sink }
    }

    /// Tracer whose spans balance but go nowhere.
    pub fn noop() -> Self {
        Self::new(Arc::new(NoopSink))
    }

    /// Tracer that records into a fresh [`InMemorySink`].
    pub fn in_memory() -> (Self, Arc<InMemorySink>) {
        let sink = Arc::new(InMemorySink::new());
        (Self::new(sink.clone()), sink)
    }

    pub fn from_config(config: &TelemetryConfig) -> Self {
        match config.sink {
            SinkKind::Tracing => Self::new(Arc::new(TracingSink::new())),
            SinkKind::Noop => Self::noop(),
        }
    }

    /// Process-wide tracer, built from [`AgentraceConfig::global`] on first use.
    pub fn global() -> &'static Tracer {
        GLOBAL_TRACER.get_or_init(|| Self::from_config(&AgentraceConfig::global().telemetry))
    }

    /// Install the process-wide tracer. Only the first call wins.
    pub fn set_global(tracer: Tracer) -> Result<()> {
        GLOBAL_TRACER
            .set(tracer)
            .map_err(|_| AgentError::Configuration("global tracer already initialized".into()))
    }

    pub fn sink(&self) -> &Arc<dyn SpanSink> {
        &self.sink
    }

    /// Open a span on the ambient scope if it reports to this tracer,
    /// otherwise as the root of a new detached scope.
    pub fn start_current_span(&self, name: impl Into<String>) -> ScopedSpan {
        match SpanScope::current() {
            Some(scope) if scope.same_tracer(self) => scope.start_span(name),
            _ => SpanScope::new(self.clone()).start_span(name),
        }
    }

    pub(crate) fn same_sink(&self, other: &Tracer) -> bool {
        Arc::ptr_eq(&self.sink, &other.sink)
    }
}

/// Open a span named `name` under the innermost open span of the ambient
/// scope. Without an ambient scope the span becomes a root span reported to
/// [`Tracer::global`].
pub fn start_current_span(name: impl Into<String>) -> ScopedSpan {
    match SpanScope::current() {
        Some(scope) => scope.start_span(name),
        None => Tracer::global().start_current_span(name),
    }
}
