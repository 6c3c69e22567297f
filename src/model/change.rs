use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Old and new value of a changed top-level field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDelta {
    /// None when the key was absent from the original record
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "present_value")]
    pub old: Option<Value>,
    pub new: Value,
}

// A key that is present always deserializes to Some, `null` included
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Sparse map of the fields that differ between two versions of a record.
/// Empty means there is nothing to persist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet {
    changes: BTreeMap<String, FieldDelta>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: String, delta: FieldDelta) {
        self.changes.insert(field, delta);
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn get(&self, field: &str) -> Option<&FieldDelta> {
        self.changes.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.changes.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.changes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldDelta)> {
        self.changes.iter()
    }

    /// Partial-update body: every changed field with its new value
    pub fn into_patch(self) -> Map<String, Value> {
        self.changes
            .into_iter()
            .map(|(field, delta)| (field, delta.new))
            .collect()
    }

    /// `{...original, ...changes}`
    pub fn apply_to(&self, original: &Map<String, Value>) -> Map<String, Value> {
        let mut merged = original.clone();
        for (field, delta) in &self.changes {
            merged.insert(field.clone(), delta.new.clone());
        }
        merged
    }
}

impl IntoIterator for ChangeSet {
    type Item = (String, FieldDelta);
    type IntoIter = std::collections::btree_map::IntoIter<String, FieldDelta>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}
