//! CLI entry point for agentrace.

use clap::{Parser, Subcommand};

/// agentrace CLI
#[derive(Parser, Debug)]
#[command(name = "agentrace", version, about = "Span-instrumented agent runs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a scripted agent and print the resulting span tree
    Demo(DemoArgs),
}

/// Arguments for the `demo` subcommand.
#[derive(Parser, Debug)]
pub struct DemoArgs {
    /// Name of the echo tool the scripted model calls
    #[arg(long, default_value = "some_tool")]
    pub tool_name: String,

    /// Name of the root agent
    #[arg(long, default_value = "some_root_agent")]
    pub agent_name: String,

    /// Number of tool-calling steps before the final answer
    #[arg(long, default_value_t = 1)]
    pub steps: usize,

    /// Stop after this many events, abandoning the rest of the run
    #[arg(long)]
    pub take: Option<usize>,

    /// User input
    #[arg(default_value = "hello")]
    pub prompt: String,
}
