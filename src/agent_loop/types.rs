//! Core invocation types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

/// Invocation lifecycle status, as observed by the consumer of the stream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InvocationStatus {
    /// Not yet exhausted, failed, cancelled or dropped.
    Running,
    Completed,
    Failed,
    Cancelled,
    /// Dropped by the consumer before it finished.
    Abandoned,
}

impl InvocationStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Summary of a finished invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvocationResult {
    pub status: InvocationStatus,
    pub events: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub finished_at: DateTime<Utc>,
}

impl InvocationResult {
    pub fn new(status: InvocationStatus, events: usize, error: Option<String>) -> Self {
        Self {
            status,
            events,
            error,
            finished_at: Utc::now(),
        }
    }
}
