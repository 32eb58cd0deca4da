//! Typed access to tool call arguments.

use serde_json::Value;

use crate::error::AgentError;

/// Argument mapping extracted from a model's tool call request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments {
    value: Value,
}

impl ToolArguments {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &Value {
        &self.value
    }

    fn required<'a, T>(
        &'a self,
        key: &str,
        kind: &str,
        extract: impl FnOnce(&'a Value) -> Option<T>,
    ) -> Result<T, AgentError> {
        self.value
            .get(key)
            .and_then(extract)
            .ok_or_else(|| AgentError::InvalidArgument(format!("Missing {kind} argument: {key}")))
    }

    pub fn get_str(&self, key: &str) -> Result<&str, AgentError> {
        self.required(key, "string", Value::as_str)
    }

    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Result<i64, AgentError> {
        self.required(key, "integer", Value::as_i64)
    }

    pub fn get_f64(&self, key: &str) -> Result<f64, AgentError> {
        self.required(key, "float", Value::as_f64)
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, AgentError> {
        self.required(key, "boolean", Value::as_bool)
    }

    /// Deserialize the whole mapping into a typed struct.
    ///
    /// Models sometimes send arguments as a JSON-encoded string; that form is
    /// decoded first, and an empty string counts as `{}`.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, AgentError> {
        let value = match &self.value {
            Value::String(raw) if raw.trim().is_empty() => serde_json::json!({}),
            Value::String(raw) => serde_json::from_str(raw.trim()).map_err(|e| {
                AgentError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
            })?,
            other => other.clone(),
        };
        serde_json::from_value(value)
            .map_err(|e| AgentError::InvalidArgument(format!("Failed to deserialize arguments: {e}")))
    }
}

impl From<Value> for ToolArguments {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn typed_getters_report_missing_keys() {
        let args = ToolArguments::new(json!({"name": "Alice", "age": 30, "ok": true}));
        assert_eq!(args.get_str("name").unwrap(), "Alice");
        assert_eq!(args.get_i64("age").unwrap(), 30);
        assert!(args.get_bool("ok").unwrap());
        let err = args.get_str("missing").unwrap_err();
        assert_eq!(err.to_string(), "Invalid argument: Missing string argument: missing");
    }

    #[test]
    fn deserialize_accepts_encoded_string() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Params {
            query: String,
        }
        let args = ToolArguments::new(json!("{\"query\": \"rust\"}"));
        let params: Params = args.deserialize().unwrap();
        assert_eq!(params.query, "rust");

        let empty = ToolArguments::new(json!(""));
        let value: serde_json::Map<String, Value> = empty.deserialize().unwrap();
        assert!(value.is_empty());
    }
}
