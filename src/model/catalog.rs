use crate::model::{FieldId, FieldValue};
use serde::{Deserialize, Serialize};

/// Widget kind declared by the attribute catalog (`formType` on the wire)
///
/// The catalog is owned by a remote service, so unknown kinds are kept
/// verbatim instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldKind {
    Text,
    Number,
    Textarea,
    Check,
    Select,
    Radio,
    Unsupported(String),
}

impl FieldKind {
    pub fn as_str(&self) -> &str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Textarea => "textarea",
            FieldKind::Check => "check",
            FieldKind::Select => "select",
            FieldKind::Radio => "radio",
            FieldKind::Unsupported(raw) => raw,
        }
    }

    /// Value a field of this kind starts with when nothing is stored
    pub fn default_value(&self) -> FieldValue {
        match self {
            FieldKind::Check => FieldValue::Boolean(false),
            _ => FieldValue::Text(String::new()),
        }
    }

    /// Kinds whose choices come from the `options` JSON
    pub fn has_options(&self) -> bool {
        matches!(self, FieldKind::Select | FieldKind::Radio)
    }
}

impl From<String> for FieldKind {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" => FieldKind::Text,
            "number" => FieldKind::Number,
            "textarea" => FieldKind::Textarea,
            "check" => FieldKind::Check,
            "select" => FieldKind::Select,
            "radio" => FieldKind::Radio,
            _ => FieldKind::Unsupported(raw),
        }
    }
}

impl From<&str> for FieldKind {
    fn from(raw: &str) -> Self {
        FieldKind::from(raw.to_string())
    }
}

impl From<FieldKind> for String {
    fn from(kind: FieldKind) -> Self {
        kind.as_str().to_string()
    }
}

/// One entry of a catalog (attribute, distribution, equipment, utility or adjacency)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: FieldId,

    /// Display text; catalogs disagree on the key name
    #[serde(default, alias = "title", alias = "name")]
    pub label: String,

    /// Only the attribute catalog declares a kind
    #[serde(default, rename = "formType", skip_serializing_if = "Option::is_none")]
    pub kind: Option<FieldKind>,

    /// JSON-encoded `[{value, label}]` list for select/radio kinds.
    /// Kept raw; parsed by `parse_options`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<serde_json::Value>,
}

impl FieldDefinition {
    pub fn new(id: FieldId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            kind: None,
            options: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<FieldKind>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        self.options = Some(serde_json::Value::String(options.into()));
        self
    }
}
