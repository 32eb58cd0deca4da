//! Span reporting sinks.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Process-unique span identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SpanId(u64);

impl SpanId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// What a sink sees for each span: `(name, parent, start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanRecord {
    pub id: SpanId,
    pub parent: Option<SpanId>,
    pub name: String,
    pub start: DateTime<Utc>,
    /// `None` while the span is open.
    pub end: Option<DateTime<Utc>>,
}

/// Receives span lifecycle notifications.
///
/// Implementations must not panic; a sink that cannot report should drop
/// the notification silently.
pub trait SpanSink: Send + Sync {
    fn on_start(&self, span: &SpanRecord);
    fn on_end(&self, span: &SpanRecord);
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl SpanSink for NoopSink {
    fn on_start(&self, _span: &SpanRecord) {}
    fn on_end(&self, _span: &SpanRecord) {}
}

/// Bridges spans into the `tracing` ecosystem.
///
/// Each span becomes a `tracing` span named `agentrace.span` whose
/// `otel.name` field carries the real name, parented explicitly on the
/// bridged parent so the hierarchy survives regardless of which thread
/// polls the invocation.
#[derive(Debug, Default)]
pub struct TracingSink {
    live: Mutex<HashMap<SpanId, tracing::Span>>,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpanSink for TracingSink {
    fn on_start(&self, span: &SpanRecord) {
        let mut live = lock(&self.live);
        let parent = span
            .parent
            .and_then(|parent| live.get(&parent))
            .and_then(tracing::Span::id);
        let bridged = tracing::info_span!(
            target: "agentrace::span",
            parent: parent,
            "agentrace.span",
            otel.name = %span.name,
            agentrace.span_id = span.id.as_u64(),
        );
        live.insert(span.id, bridged);
    }

    fn on_end(&self, span: &SpanRecord) {
        // Dropping the last handle closes the tracing span.
        let closed = lock(&self.live).remove(&span.id);
        drop(closed);
    }
}

/// One entry in the [`InMemorySink`] log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanEvent {
    Started { id: SpanId, name: String },
    Ended { id: SpanId, name: String },
}

#[derive(Debug, Default)]
struct Recorded {
    log: Vec<SpanEvent>,
    spans: Vec<SpanRecord>,
}

/// Records every span in memory.
///
/// Used by tests and by the CLI summary.
#[derive(Debug, Default)]
pub struct InMemorySink {
    recorded: Mutex<Recorded>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names passed to `start_current_span`, in open order.
    pub fn started_names(&self) -> Vec<String> {
        lock(&self.recorded)
            .spans
            .iter()
            .map(|span| span.name.clone())
            .collect()
    }

    /// Multiset of opened span names.
    pub fn name_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for span in &lock(&self.recorded).spans {
            *counts.entry(span.name.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn count(&self, name: &str) -> usize {
        lock(&self.recorded)
            .spans
            .iter()
            .filter(|span| span.name == name)
            .count()
    }

    /// All spans in open order; closed spans carry an end time.
    pub fn spans(&self) -> Vec<SpanRecord> {
        lock(&self.recorded).spans.clone()
    }

    /// Spans that were opened but not yet closed.
    pub fn open_spans(&self) -> Vec<SpanRecord> {
        lock(&self.recorded)
            .spans
            .iter()
            .filter(|span| span.end.is_none())
            .cloned()
            .collect()
    }

    /// Start/end notifications in the order they arrived.
    pub fn log(&self) -> Vec<SpanEvent> {
        lock(&self.recorded).log.clone()
    }

    /// First span with the given name.
    pub fn find(&self, name: &str) -> Option<SpanRecord> {
        lock(&self.recorded)
            .spans
            .iter()
            .find(|span| span.name == name)
            .cloned()
    }

    pub fn clear(&self) {
        let mut recorded = lock(&self.recorded);
        recorded.log.clear();
        recorded.spans.clear();
    }

    /// Indented span tree, one span per line, children in open order.
    pub fn render_tree(&self) -> String {
        let spans = self.spans();
        let mut out = String::new();
        let roots = spans.iter().filter(|span| {
            span.parent
                .map_or(true, |parent| !spans.iter().any(|s| s.id == parent))
        });
        for root in roots {
            render_node(&spans, root, 0, &mut out);
        }
        out
    }
}

fn render_node(spans: &[SpanRecord], node: &SpanRecord, depth: usize, out: &mut String) {
    let status = if node.end.is_some() { "" } else { " (open)" };
    out.push_str(&format!("{}{}{}\n", "  ".repeat(depth), node.name, status));
    for child in spans.iter().filter(|span| span.parent == Some(node.id)) {
        render_node(spans, child, depth + 1, out);
    }
}

impl SpanSink for InMemorySink {
    fn on_start(&self, span: &SpanRecord) {
        let mut recorded = lock(&self.recorded);
        recorded.log.push(SpanEvent::Started {
            id: span.id,
            name: span.name.clone(),
        });
        recorded.spans.push(span.clone());
    }

    fn on_end(&self, span: &SpanRecord) {
        let mut recorded = lock(&self.recorded);
        recorded.log.push(SpanEvent::Ended {
            id: span.id,
            name: span.name.clone(),
        });
        if let Some(stored) = recorded.spans.iter_mut().find(|s| s.id == span.id) {
            stored.end = span.end;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, parent: Option<SpanId>) -> SpanRecord {
        SpanRecord {
            id: SpanId::next(),
            parent,
            name: name.to_string(),
            start: Utc::now(),
            end: None,
        }
    }

    #[test]
    fn in_memory_sink_tracks_open_and_closed() {
        let sink = InMemorySink::new();
        let root = record("invocation", None);
        let mut child = record("call_llm", Some(root.id));
        sink.on_start(&root);
        sink.on_start(&child);
        child.end = Some(Utc::now());
        sink.on_end(&child);

        assert_eq!(sink.started_names(), vec!["invocation", "call_llm"]);
        assert_eq!(sink.open_spans().len(), 1);
        assert_eq!(sink.count("call_llm"), 1);
        assert_eq!(sink.render_tree(), "invocation (open)\n  call_llm\n");
    }

    #[test]
    fn tracing_sink_releases_spans_on_end() {
        let sink = TracingSink::new();
        let root = record("invocation", None);
        let child = record("call_llm", Some(root.id));
        sink.on_start(&root);
        sink.on_start(&child);
        sink.on_end(&child);
        sink.on_end(&root);
        assert!(lock(&sink.live).is_empty());
    }
}
