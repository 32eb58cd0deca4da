//! agentrace: a span-instrumented agent execution engine.
//!
//! A [`Runner`](agent_loop::Runner) turns user input into a lazy stream of
//! [`Event`](types::Event)s produced by a tree of [`Agent`](agent::Agent)s.
//! Every stage reports a span to a [`Tracer`](telemetry::Tracer):
//!
//! ```text
//! invocation
//!   agent_run [<agent>]
//!     call_llm
//!     execute_tool <tool>
//! ```
//!
//! Spans close whether the stage succeeds, fails, or the consumer stops
//! pulling, and concurrent invocations never share parentage.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use agentrace::prelude::*;
//!
//! # async fn example() -> agentrace::error::Result<()> {
//! let provider = Arc::new(ScriptedProvider::new("scripted"));
//! provider.queue_text("Hello!");
//! let agent = LlmAgent::new("greeter", provider);
//! let (tracer, sink) = Tracer::in_memory();
//! let events = Runner::new(Arc::new(agent))
//!     .with_tracer(tracer)
//!     .run_with_new_session("hi")
//!     .await?;
//! assert_eq!(events[0].text_content(), "Hello!");
//! print!("{}", sink.render_tree());
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod agent_loop;
pub mod config;
pub mod error;
pub mod prelude;
pub mod provider;
pub mod telemetry;
pub mod tools;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;
