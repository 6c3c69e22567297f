use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

use crate::model::{
    is_explicit_false, parse_options, CatalogKind, FieldDefinition, FieldId, FieldValue, ReconciledField,
    ValueType,
};

/// How a catalog stores its selection value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueStyle {
    /// `"true"`/`"false"` presence flag
    Presence,
    /// Typed value with a `valueType` tag (attributes)
    Typed,
}

/// Per-catalog parameters of the reconciliation algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogAdapter {
    pub kind: CatalogKind,
    /// Key of the selection array in entity records and submit payloads
    pub collection_key: &'static str,
    /// Foreign key into the catalog inside each selection
    pub id_field: &'static str,
    pub value_style: ValueStyle,
    pub additional_information: bool,
    pub brand: bool,
}

pub const VALUE_FIELD: &str = "value";
pub const VALUE_TYPE_FIELD: &str = "valueType";
pub const ADDITIONAL_INFORMATION_FIELD: &str = "additionalInformation";
pub const BRAND_FIELD: &str = "brand";

impl CatalogAdapter {
    pub const ATTRIBUTES: CatalogAdapter = CatalogAdapter {
        kind: CatalogKind::Attributes,
        collection_key: "attributes",
        id_field: "attributeId",
        value_style: ValueStyle::Typed,
        additional_information: false,
        brand: false,
    };

    pub const DISTRIBUTIONS: CatalogAdapter = CatalogAdapter {
        kind: CatalogKind::Distributions,
        collection_key: "distributions",
        id_field: "distributionId",
        value_style: ValueStyle::Presence,
        additional_information: true,
        brand: false,
    };

    pub const EQUIPMENT: CatalogAdapter = CatalogAdapter {
        kind: CatalogKind::Equipment,
        collection_key: "equipments",
        id_field: "equipmentId",
        value_style: ValueStyle::Presence,
        additional_information: true,
        brand: true,
    };

    pub const UTILITIES: CatalogAdapter = CatalogAdapter {
        kind: CatalogKind::Utilities,
        collection_key: "utilities",
        id_field: "utilityId",
        value_style: ValueStyle::Presence,
        additional_information: true,
        brand: false,
    };

    pub const ADJACENCIES: CatalogAdapter = CatalogAdapter {
        kind: CatalogKind::Adjacencies,
        collection_key: "adjacencies",
        id_field: "adjacencyId",
        value_style: ValueStyle::Presence,
        additional_information: true,
        brand: false,
    };

    pub fn for_kind(kind: CatalogKind) -> &'static CatalogAdapter {
        match kind {
            CatalogKind::Attributes => &Self::ATTRIBUTES,
            CatalogKind::Distributions => &Self::DISTRIBUTIONS,
            CatalogKind::Equipment => &Self::EQUIPMENT,
            CatalogKind::Utilities => &Self::UTILITIES,
            CatalogKind::Adjacencies => &Self::ADJACENCIES,
        }
    }

    /// Value a field starts with when no selection exists for it
    pub fn default_value(&self, definition: &FieldDefinition) -> FieldValue {
        match self.value_style {
            ValueStyle::Presence => FieldValue::Boolean(false),
            ValueStyle::Typed => match &definition.kind {
                Some(kind) => kind.default_value(),
                None => FieldValue::Text(String::new()),
            },
        }
    }

    fn blank_field(&self, definition: &FieldDefinition, value: FieldValue) -> ReconciledField {
        let options = match &definition.kind {
            Some(kind) if kind.has_options() => parse_options(definition.options.as_ref()),
            _ => Vec::new(),
        };

        ReconciledField {
            field_id: definition.id,
            label: definition.label.clone(),
            kind: definition.kind.clone(),
            value,
            additional_information: self.additional_information.then(String::new),
            brand: self.brand.then(String::new),
            options,
        }
    }

    pub fn default_field(&self, definition: &FieldDefinition) -> ReconciledField {
        self.blank_field(definition, self.default_value(definition))
    }

    pub fn field_from_selection(&self, definition: &FieldDefinition, selection: &Map<String, Value>) -> ReconciledField {
        let stored = selection.get(VALUE_FIELD);
        let value = match self.value_style {
            // The selection exists, so the item is present unless it says otherwise
            ValueStyle::Presence => FieldValue::Boolean(!is_explicit_false(stored)),
            ValueStyle::Typed => {
                let value_type = selection
                    .get(VALUE_TYPE_FIELD)
                    .and_then(Value::as_str)
                    .and_then(ValueType::parse);
                FieldValue::from_stored(stored, value_type, definition.kind.as_ref())
                    .unwrap_or_else(|| self.default_value(definition))
            }
        };

        let mut field = self.blank_field(definition, value);
        if self.additional_information {
            field.additional_information = Some(text_of(selection.get(ADDITIONAL_INFORMATION_FIELD)));
        }
        if self.brand {
            field.brand = Some(text_of(selection.get(BRAND_FIELD)));
        }
        field
    }
}

fn text_of(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Failure to read an entity's stored selections
#[derive(Debug, Error, PartialEq)]
pub enum ReconcileError {
    #[error("selection #{index} is not an object")]
    NotAnObject { index: usize },
    #[error("selection #{index} has no usable `{field}`")]
    MissingId { index: usize, field: &'static str },
}

fn selection_id(selection: &Map<String, Value>, field: &str) -> Option<FieldId> {
    match selection.get(field)? {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Index selections by catalog id; the first selection for an id wins
pub fn index_selections<'a>(
    adapter: &CatalogAdapter,
    selections: &'a [Value],
) -> Result<HashMap<FieldId, &'a Map<String, Value>>, ReconcileError> {
    let mut index = HashMap::with_capacity(selections.len());

    for (position, selection) in selections.iter().enumerate() {
        let selection = selection
            .as_object()
            .ok_or(ReconcileError::NotAnObject { index: position })?;
        let id = selection_id(selection, adapter.id_field).ok_or(ReconcileError::MissingId {
            index: position,
            field: adapter.id_field,
        })?;
        index.entry(id).or_insert(selection);
    }

    Ok(index)
}

fn default_fields(adapter: &CatalogAdapter, catalog: &[FieldDefinition]) -> Vec<ReconciledField> {
    catalog.iter().map(|definition| adapter.default_field(definition)).collect()
}

/// Build one form field per catalog entry, in catalog order.
///
/// Stored selections fill in values where their id matches a catalog entry;
/// selections for ids missing from the catalog are dropped. New entities and
/// unreadable selections get defaults for every field.
pub fn reconcile(
    adapter: &CatalogAdapter,
    catalog: &[FieldDefinition],
    existing_selections: Option<&[Value]>,
    is_new_entity: bool,
) -> Vec<ReconciledField> {
    let selections = match existing_selections {
        Some(selections) if !is_new_entity => selections,
        _ => return default_fields(adapter, catalog),
    };

    let index = match index_selections(adapter, selections) {
        Ok(index) => index,
        Err(e) => {
            log::warn!("Unreadable {} selections, using defaults: {}", adapter.kind, e);
            return default_fields(adapter, catalog);
        }
    };

    let fields: Vec<ReconciledField> = catalog
        .iter()
        .map(|definition| match index.get(&definition.id) {
            Some(selection) => adapter.field_from_selection(definition, selection),
            None => adapter.default_field(definition),
        })
        .collect();

    let matched = catalog.iter().filter(|d| index.contains_key(&d.id)).count();
    if matched < index.len() {
        log::debug!(
            "Dropped {} {} selection(s) with no catalog entry",
            index.len() - matched,
            adapter.kind
        );
    }

    fields
}
