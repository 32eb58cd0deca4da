//! agentrace CLI binary entry point.

use std::sync::Arc;

use clap::Parser;
use futures::StreamExt;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use agentrace::agent::LlmAgent;
use agentrace::agent_loop::{InvocationStatus, Runner};
use agentrace::cli::{Cli, Commands, DemoArgs};
use agentrace::provider::ScriptedProvider;
use agentrace::telemetry::Tracer;
use agentrace::tools::{AgentTool, AgentToolParameters};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Demo(args) => handle_demo(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn handle_demo(args: DemoArgs) -> Result<(), Box<dyn std::error::Error>> {
    let provider = Arc::new(ScriptedProvider::new("scripted-demo"));
    for step in 0..args.steps {
        provider.queue_tool_call(&args.tool_name, json!({ "text": format!("step {step}") }));
    }
    provider.queue_text("all done");

    let echo = AgentTool::new(
        args.tool_name.clone(),
        "Echo the given text",
        AgentToolParameters::object().string("text", "Text to echo", true).build(),
        |args, _ctx| async move { Ok(json!({ "echo": args.get_str("text")? })) },
    );
    let agent = LlmAgent::new(args.agent_name.clone(), provider).with_tool(Arc::new(echo));

    let (tracer, sink) = Tracer::in_memory();
    let runner = Runner::new(Arc::new(agent)).with_tracer(tracer);

    let mut events = runner.run_async_with_new_session(&args.prompt);
    let limit = args.take.unwrap_or(usize::MAX);
    let mut seen = 0;
    while seen < limit {
        let Some(item) = events.next().await else {
            break;
        };
        let Ok(event) = item else {
            break;
        };
        seen += 1;
        println!("event {seen} [{}]: {}", event.author(), serde_json::to_string(event.content())?);
    }
    let summary = events.result();
    drop(events);

    // Stopping early with --take leaves the invocation to be abandoned by the drop.
    let status = if summary.status.is_terminal() {
        summary.status
    } else {
        InvocationStatus::Abandoned
    };
    println!();
    println!("invocation {status} after {} events", summary.events);
    print!("{}", sink.render_tree());
    for (name, count) in sink.name_counts() {
        println!("{count:>3}  {name}");
    }
    match summary.error {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}
