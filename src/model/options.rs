use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One choice of a select/radio attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: Value,
    #[serde(default)]
    pub label: String,
}

impl FieldOption {
    pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// Option value as it is stored in a selection
    pub fn value_text(&self) -> String {
        match &self.value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("options are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("options must be a list or a JSON-encoded list, got {0}")]
    UnexpectedShape(&'static str),
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn try_parse_options(raw: &Value) -> Result<Vec<FieldOption>, OptionsError> {
    match raw {
        Value::String(encoded) if encoded.trim().is_empty() => Ok(Vec::new()),
        Value::String(encoded) => Ok(serde_json::from_str(encoded)?),
        Value::Array(_) => Ok(serde_json::from_value(raw.clone())?),
        Value::Null => Ok(Vec::new()),
        other => Err(OptionsError::UnexpectedShape(shape_name(other))),
    }
}

/// Parse a catalog `options` field. Malformed input yields an empty list.
pub fn parse_options(raw: Option<&Value>) -> Vec<FieldOption> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    match try_parse_options(raw) {
        Ok(options) => options,
        Err(e) => {
            log::warn!("Ignoring malformed field options: {}", e);
            Vec::new()
        }
    }
}
