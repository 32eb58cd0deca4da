//! Agent loop primitives: invocation context, model and tool invokers, and
//! the runner.

pub mod context;
pub mod llm_phase;
pub mod runner;
pub mod tool_phase;
pub mod types;

pub use context::InvocationContext;
pub use llm_phase::call_llm;
pub use runner::{InvocationStream, Runner};
pub use tool_phase::{dispatch_tool_calls, execute_tool};
pub use types::{InvocationResult, InvocationStatus};
