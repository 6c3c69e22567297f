use serde::Serialize;
use serde_json::{Map, Value};

use crate::model::{ChangeSet, FieldDelta};

/// Compute the fields of `new_record` that differ from `original_record`.
///
/// Only keys of `new_record` are inspected; keys that exist solely in the
/// original are not reported. A key missing from the original compares as
/// absent, which is not the same as `null`.
pub fn compute_changes(new_record: &Map<String, Value>, original_record: &Map<String, Value>) -> ChangeSet {
    let mut changes = ChangeSet::new();

    for (field, new_value) in new_record {
        let old_value = original_record.get(field);
        if !values_equal(Some(new_value), old_value) {
            changes.insert(
                field.clone(),
                FieldDelta {
                    old: old_value.cloned(),
                    new: new_value.clone(),
                },
            );
        }
    }

    changes
}

/// Same as `compute_changes` for any serializable record type.
/// Records that do not serialize to a JSON object produce an empty change set.
pub fn compute_record_changes<T: Serialize>(new_record: &T, original_record: &T) -> Result<ChangeSet, serde_json::Error> {
    let new_value = serde_json::to_value(new_record)?;
    let original_value = serde_json::to_value(original_record)?;

    match (new_value, original_value) {
        (Value::Object(new_map), Value::Object(original_map)) => Ok(compute_changes(&new_map, &original_map)),
        _ => Ok(ChangeSet::new()),
    }
}

/// Value-aware equality used by the change detector
pub fn values_equal(left: Option<&Value>, right: Option<&Value>) -> bool {
    let (left, right) = match (left, right) {
        (Some(l), Some(r)) => (l, r),
        (None, None) => return true,
        _ => return false,
    };

    // "2500.00" and 2500 are the same amount
    if let (Some(l), Some(r)) = (as_finite_number(left), as_finite_number(right)) {
        return l == r;
    }

    match (left, right) {
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(a, b)| strict_equal(a, b))
        }
        (Value::Object(l), Value::Object(r)) => objects_equal(l, r),
        _ => strict_equal(left, right),
    }
}

/// Numbers, and strings that parse as a finite number
pub fn as_finite_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64().filter(|n| n.is_finite()),
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            text.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}

/// JSON equality at every depth, without string-to-number coercion
fn strict_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        // serde_json keeps 1 and 1.0 apart; JSON does not
        (Value::Number(l), Value::Number(r)) => l.as_f64() == r.as_f64(),
        (Value::Array(l), Value::Array(r)) => l.len() == r.len() && l.iter().zip(r).all(|(a, b)| strict_equal(a, b)),
        (Value::Object(l), Value::Object(r)) => objects_equal(l, r),
        _ => left == right,
    }
}

fn objects_equal(left: &Map<String, Value>, right: &Map<String, Value>) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .all(|(key, value)| right.get(key).is_some_and(|other| strict_equal(value, other)))
}
