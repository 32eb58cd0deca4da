//! Tools the model can call.

pub mod arguments;
pub mod tool;
pub mod types;

pub use arguments::ToolArguments;
pub use tool::{AgentTool, Tool, ToolExecutionContext};
pub use types::{AgentToolParameters, ParameterBuilder};
