//! Span names emitted by the execution pipeline.
//!
//! These strings are the external contract with span backends and must not
//! change shape: `agent_run` wraps the agent name in brackets, `execute_tool`
//! joins the tool name with a single space.

/// Span around one top-level invocation.
pub const INVOCATION: &str = "invocation";

/// Span around one model call.
pub const CALL_LLM: &str = "call_llm";

/// Span around one agent run: `agent_run [<agent name>]`.
pub fn agent_run(agent_name: &str) -> String {
    format!("agent_run [{agent_name}]")
}

/// Span around one tool execution: `execute_tool <tool name>`.
pub fn execute_tool(tool_name: &str) -> String {
    format!("execute_tool {tool_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_bit_exact() {
        assert_eq!(INVOCATION, "invocation");
        assert_eq!(CALL_LLM, "call_llm");
        assert_eq!(agent_run("some_root_agent"), "agent_run [some_root_agent]");
        assert_eq!(execute_tool("some_tool"), "execute_tool some_tool");
    }
}
