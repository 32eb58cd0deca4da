//! Error types for agentrace.

use thiserror::Error;

/// Primary error type for agent execution.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Model error ({model}): {message}")]
    Model { model: String, message: String },

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Model call limit of {0} exceeded")]
    MaxStepsExceeded(usize),

    #[error("Agent error ({agent}): {message}")]
    Agent { agent: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Broad error category, mirrors where in the pipeline the failure began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Model,
    ToolExecution,
    AgentLogic,
    Configuration,
    Serialization,
}

impl AgentError {
    /// Create a model error.
    pub fn model(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Model {
            model: model.into(),
            message: message.into(),
        }
    }

    /// Create a tool execution error.
    pub fn tool(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Create an agent-logic error.
    pub fn agent(agent: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Agent {
            agent: agent.into(),
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Model { .. } => ErrorCategory::Model,
            Self::ToolExecution { .. } | Self::ToolNotFound(_) | Self::InvalidArgument(_) => {
                ErrorCategory::ToolExecution
            }
            Self::Configuration(_) | Self::Toml(_) | Self::Io(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::MaxStepsExceeded(_) | Self::Agent { .. } => ErrorCategory::AgentLogic,
        }
    }

    /// Whether retrying the same call might succeed.
    ///
    /// Only model failures qualify; retry policy itself is left to callers.
    pub fn is_retryable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Model)
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, AgentError>;
