//! Streaming types.

use futures::stream::BoxStream;

use super::event::Event;
use crate::error::AgentError;

/// Lazy, pull-driven sequence of events produced by an agent.
///
/// Dropping the stream abandons the run; any spans still open inside it
/// close as part of that drop.
pub type EventStream = BoxStream<'static, Result<Event, AgentError>>;
