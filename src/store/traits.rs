use serde_json::{Map, Value};

use crate::api::ApiError;
use crate::model::{CatalogKind, FieldDefinition, FileHandle, Id};

/// REST back-office the forms read from and write to
#[async_trait::async_trait]
pub trait BackofficeApi: Send + Sync {
    /// List the entries of a field catalog
    async fn fetch_catalog(&self, kind: CatalogKind) -> Result<Vec<FieldDefinition>, ApiError>;
    /// Get a property record with its nested selection arrays
    async fn fetch_property(&self, id: &Id) -> Result<Map<String, Value>, ApiError>;
    /// Create a property; returns the response `data`
    async fn create_property(&self, payload: Map<String, Value>) -> Result<Value, ApiError>;
    /// Replace a property wholesale; returns the response `data`
    async fn update_property(&self, id: &Id, payload: Map<String, Value>) -> Result<Value, ApiError>;
    /// Partial update of any simple record (clients, advisers, transactions...)
    async fn patch_record(&self, resource: &str, id: &Id, payload: Map<String, Value>) -> Result<Value, ApiError>;
}

/// File storage used for form attachments
#[async_trait::async_trait]
pub trait Uploader: Send + Sync {
    /// Persist the files and return their URLs, in input order
    async fn upload(&self, files: Vec<FileHandle>) -> Result<Vec<String>, ApiError>;
}
