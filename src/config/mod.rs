//! Configuration system (layered: defaults < TOML file < environment).

use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::Result;

/// Global default config (lazy-initialized from env).
static DEFAULT_CONFIG: OnceLock<AgentraceConfig> = OnceLock::new();

/// Default cap on model calls per invocation.
pub const DEFAULT_MAX_LLM_CALLS: usize = 20;

/// Environment variable naming a TOML config file.
pub const CONFIG_PATH_ENV: &str = "AGENTRACE_CONFIG";

/// What a model-backed agent does when a tool call fails.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ToolErrorPolicy {
    /// Hand the failure back to the model as an error result and keep going.
    #[default]
    Report,
    /// End the agent run with the tool error.
    Propagate,
}

/// Where spans are reported when no tracer is given explicitly.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SinkKind {
    /// Forward to the `tracing` dispatcher.
    #[default]
    Tracing,
    /// Discard.
    Noop,
}

/// Per-invocation execution limits and policies.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunConfig {
    #[builder(default = DEFAULT_MAX_LLM_CALLS)]
    pub max_llm_calls: usize,
    #[builder(default)]
    pub tool_error_policy: ToolErrorPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_llm_calls: DEFAULT_MAX_LLM_CALLS,
            tool_error_policy: ToolErrorPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TelemetryConfig {
    pub sink: SinkKind,
}

/// Top-level configuration.
///
/// ```toml
/// [run]
/// max_llm_calls = 8
/// tool_error_policy = "propagate"
///
/// [telemetry]
/// sink = "noop"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AgentraceConfig {
    pub run: RunConfig,
    pub telemetry: TelemetryConfig,
}

impl AgentraceConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Load `.env`, then the file named by `AGENTRACE_CONFIG` (if any), then
    /// apply `AGENTRACE_*` overrides.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(&path).unwrap_or_else(|err| {
                tracing::warn!(%path, error = %err, "ignoring unreadable config file");
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        config.apply_env_vars(std::env::vars());
        config
    }

    /// Apply `AGENTRACE_*` overrides from the given variables.
    ///
    /// Unparseable values are logged and skipped.
    pub fn apply_env_vars<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let (key, value) = (key.as_ref(), value.as_ref().trim());
            match key {
                "AGENTRACE_MAX_LLM_CALLS" => set_parsed(key, value, &mut self.run.max_llm_calls),
                "AGENTRACE_TOOL_ERROR_POLICY" => {
                    set_parsed(key, value, &mut self.run.tool_error_policy)
                }
                "AGENTRACE_SPAN_SINK" => set_parsed(key, value, &mut self.telemetry.sink),
                _ => {}
            }
        }
    }

    /// Get (or create) the global default config.
    pub fn global() -> &'static AgentraceConfig {
        DEFAULT_CONFIG.get_or_init(Self::from_env)
    }
}

fn set_parsed<T>(key: &str, value: &str, slot: &mut T)
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value.parse() {
        Ok(parsed) => *slot = parsed,
        Err(err) => tracing::warn!(key, value, error = %err, "ignoring invalid config override"),
    }
}
