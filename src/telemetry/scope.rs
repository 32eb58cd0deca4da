//! Ambient span stack and scoped span guards.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::sink::{lock, SpanId, SpanRecord};
use super::Tracer;

thread_local! {
    static CURRENT: RefCell<Option<SpanScope>> = const { RefCell::new(None) };
}

/// Active-span stack for one logical execution context (one invocation).
///
/// A scope is only ambient while entered; [`ScopedStream`](super::ScopedStream)
/// enters it around every poll so concurrent invocations never observe each
/// other's spans as parents.
#[derive(Clone)]
pub struct SpanScope {
    inner: Arc<ScopeInner>,
}

struct ScopeInner {
    tracer: Tracer,
    stack: Mutex<Vec<SpanId>>,
}

impl fmt::Debug for SpanScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpanScope")
            .field("stack", &*lock(&self.inner.stack))
            .finish()
    }
}

impl SpanScope {
    pub fn new(tracer: Tracer) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                tracer,
                stack: Mutex::new(Vec::new()),
            }),
        }
    }

    /// The scope entered on this thread, if any.
    pub fn current() -> Option<SpanScope> {
        CURRENT
            .try_with(|current| current.borrow().clone())
            .ok()
            .flatten()
    }

    /// Make this scope ambient until the guard drops. Nests freely.
    pub fn enter(&self) -> ScopeGuard {
        let previous = CURRENT
            .try_with(|current| current.replace(Some(self.clone())))
            .ok()
            .flatten();
        ScopeGuard {
            previous,
            _not_send: PhantomData,
        }
    }

    pub fn tracer(&self) -> &Tracer {
        &self.inner.tracer
    }

    /// Innermost open span of this scope.
    pub fn active_span(&self) -> Option<SpanId> {
        lock(&self.inner.stack).last().copied()
    }

    pub fn depth(&self) -> usize {
        lock(&self.inner.stack).len()
    }

    /// Open a span as a child of the innermost open span and push it.
    pub fn start_span(&self, name: impl Into<String>) -> ScopedSpan {
        let record = {
            let mut stack = lock(&self.inner.stack);
            let record = SpanRecord {
                id: SpanId::next(),
                parent: stack.last().copied(),
                name: name.into(),
                start: Utc::now(),
                end: None,
            };
            stack.push(record.id);
            record
        };
        self.inner.tracer.sink().on_start(&record);
        ScopedSpan {
            scope: self.clone(),
            record,
            ended: false,
        }
    }

    fn pop(&self, span: &SpanRecord) {
        let mut stack = lock(&self.inner.stack);
        match stack.iter().rposition(|id| *id == span.id) {
            Some(index) if index + 1 == stack.len() => {
                stack.pop();
            }
            Some(index) => {
                tracing::warn!(
                    span = %span.name,
                    depth = stack.len(),
                    "span closed before its children"
                );
                stack.remove(index);
            }
            None => {}
        }
    }

    pub(super) fn same_tracer(&self, tracer: &Tracer) -> bool {
        self.inner.tracer.same_sink(tracer)
    }
}

/// Restores the previously ambient scope on drop.
#[must_use = "the scope is only ambient while the guard is alive"]
pub struct ScopeGuard {
    previous: Option<SpanScope>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        let _ = CURRENT.try_with(|current| *current.borrow_mut() = previous);
    }
}

/// An open span. Ends exactly once: on [`ScopedSpan::end`] or on drop.
#[must_use = "the span ends as soon as the guard is dropped"]
pub struct ScopedSpan {
    scope: SpanScope,
    record: SpanRecord,
    ended: bool,
}

impl ScopedSpan {
    pub fn id(&self) -> SpanId {
        self.record.id
    }

    pub fn parent(&self) -> Option<SpanId> {
        self.record.parent
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// End the span now instead of at scope exit.
    pub fn end(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.scope.pop(&self.record);
        self.record.end = Some(Utc::now());
        self.scope.tracer().sink().on_end(&self.record);
    }
}

impl fmt::Debug for ScopedSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedSpan")
            .field("id", &self.record.id)
            .field("name", &self.record.name)
            .field("parent", &self.record.parent)
            .finish()
    }
}

impl Drop for ScopedSpan {
    fn drop(&mut self) {
        self.finish();
    }
}
