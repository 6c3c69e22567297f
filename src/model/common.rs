use serde::{Deserialize, Serialize};

/// Identifier of a back-office entity (property, client, adviser...)
pub type Id = String;

/// Identifier of a catalog entry
pub type FieldId = i64;

/// Wire tag describing how a stored selection value should be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Number,
    Boolean,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
        }
    }

    /// Lenient parse of a stored `valueType` tag; unknown tags yield None
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "string" => Some(ValueType::String),
            "number" => Some(ValueType::Number),
            "boolean" | "bool" => Some(ValueType::Boolean),
            _ => None,
        }
    }
}

/// The five catalogs a property form is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Attributes,
    Distributions,
    Equipment,
    Utilities,
    Adjacencies,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 5] = [
        CatalogKind::Attributes,
        CatalogKind::Distributions,
        CatalogKind::Equipment,
        CatalogKind::Utilities,
        CatalogKind::Adjacencies,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::Attributes => "attributes",
            CatalogKind::Distributions => "distributions",
            CatalogKind::Equipment => "equipment",
            CatalogKind::Utilities => "utilities",
            CatalogKind::Adjacencies => "adjacencies",
        }
    }

    /// Path of the catalog listing endpoint
    pub fn endpoint(&self) -> &'static str {
        match self {
            CatalogKind::Attributes => "/attributes",
            CatalogKind::Distributions => "/distributions",
            CatalogKind::Equipment => "/equipments",
            CatalogKind::Utilities => "/utilities",
            CatalogKind::Adjacencies => "/adjacencies",
        }
    }
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
