use crate::model::{FieldId, FieldKind, FieldOption, ValueType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// In-memory value of a form field
///
/// The wire stores everything as strings (`"true"`, `"2500"`); that encoding
/// only appears at the submit boundary via `to_wire`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    Boolean(bool),
    Text(String),
    /// Raw text as typed; not coerced while the user is editing
    Number(String),
}

impl FieldValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            FieldValue::Boolean(_) => ValueType::Boolean,
            FieldValue::Text(_) => ValueType::String,
            FieldValue::Number(_) => ValueType::Number,
        }
    }

    /// String encoding sent to the API
    pub fn to_wire(&self) -> String {
        match self {
            FieldValue::Boolean(true) => "true".to_string(),
            FieldValue::Boolean(false) => "false".to_string(),
            FieldValue::Text(text) | FieldValue::Number(text) => text.clone(),
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(self, FieldValue::Boolean(true))
    }

    /// Read a stored attribute value.
    ///
    /// Returns None when nothing usable is stored (missing, null or empty),
    /// so the caller can fall back to the kind default.
    pub fn from_stored(
        raw: Option<&Value>,
        value_type: Option<ValueType>,
        kind: Option<&FieldKind>,
    ) -> Option<Self> {
        let value = match raw? {
            Value::Null => return None,
            Value::Bool(flag) => return Some(FieldValue::Boolean(*flag)),
            Value::Number(number) => {
                return Some(match kind {
                    Some(FieldKind::Check) => FieldValue::Boolean(number.as_f64() != Some(0.0)),
                    _ => FieldValue::Number(number.to_string()),
                })
            }
            Value::String(text) if text.is_empty() => return None,
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };

        // A check field is always a toggle, whatever tag was stored with it
        if matches!(kind, Some(FieldKind::Check)) {
            return Some(FieldValue::Boolean(is_true_text(&value)));
        }

        Some(match value_type {
            Some(ValueType::Boolean) => FieldValue::Boolean(is_true_text(&value)),
            Some(ValueType::Number) => FieldValue::Number(value),
            Some(ValueType::String) => FieldValue::Text(value),
            None => match kind {
                Some(FieldKind::Number) => FieldValue::Number(value),
                _ => FieldValue::Text(value),
            },
        })
    }
}

/// True only for an explicit `"false"` / `false` / `0`
pub fn is_explicit_false(raw: Option<&Value>) -> bool {
    match raw {
        Some(Value::Bool(flag)) => !flag,
        Some(Value::String(text)) => {
            let text = text.trim();
            text.eq_ignore_ascii_case("false") || text == "0"
        }
        Some(Value::Number(number)) => number.as_f64() == Some(0.0),
        _ => false,
    }
}

fn is_true_text(text: &str) -> bool {
    let text = text.trim();
    text.eq_ignore_ascii_case("true") || text == "1"
}

/// A catalog entry merged with the entity's stored selection, ready for editing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledField {
    pub field_id: FieldId,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FieldKind>,
    pub value: FieldValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_information: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Parsed choices for select/radio attributes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
}

impl ReconciledField {
    pub fn value_type(&self) -> ValueType {
        self.value.value_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_encoding() {
        assert_eq!(FieldValue::Boolean(true).to_wire(), "true");
        assert_eq!(FieldValue::Boolean(false).to_wire(), "false");
        assert_eq!(FieldValue::Number("2500.00".to_string()).to_wire(), "2500.00");
        assert_eq!(FieldValue::Text("north".to_string()).value_type(), ValueType::String);
    }

    #[test]
    fn test_from_stored_empty_falls_back() {
        assert_eq!(FieldValue::from_stored(None, None, None), None);
        assert_eq!(FieldValue::from_stored(Some(&json!(null)), None, None), None);
        assert_eq!(
            FieldValue::from_stored(Some(&json!("")), Some(ValueType::String), None),
            None
        );
    }

    #[test]
    fn test_from_stored_check_kind_is_boolean() {
        let check = FieldKind::Check;
        assert_eq!(
            FieldValue::from_stored(Some(&json!("true")), Some(ValueType::String), Some(&check)),
            Some(FieldValue::Boolean(true))
        );
        assert_eq!(
            FieldValue::from_stored(Some(&json!("false")), None, Some(&check)),
            Some(FieldValue::Boolean(false))
        );
    }

    #[test]
    fn test_from_stored_respects_value_type() {
        assert_eq!(
            FieldValue::from_stored(Some(&json!("120")), Some(ValueType::Number), None),
            Some(FieldValue::Number("120".to_string()))
        );
        assert_eq!(
            FieldValue::from_stored(Some(&json!("120")), Some(ValueType::String), Some(&FieldKind::Number)),
            Some(FieldValue::Text("120".to_string()))
        );
        assert_eq!(
            FieldValue::from_stored(Some(&json!("85")), None, Some(&FieldKind::Number)),
            Some(FieldValue::Number("85".to_string()))
        );
        assert_eq!(
            FieldValue::from_stored(Some(&json!(3)), None, None),
            Some(FieldValue::Number("3".to_string()))
        );
    }

    #[test]
    fn test_explicit_false() {
        assert!(is_explicit_false(Some(&json!("false"))));
        assert!(is_explicit_false(Some(&json!(false))));
        assert!(!is_explicit_false(Some(&json!("true"))));
        assert!(!is_explicit_false(None));
        assert!(!is_explicit_false(Some(&json!(null))));
    }
}
