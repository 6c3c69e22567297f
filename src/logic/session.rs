use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::api::{response_message, ApiError};
use crate::logic::input::{InputControl, InputEvent};
use crate::logic::reconcile::{
    reconcile, CatalogAdapter, ValueStyle, ADDITIONAL_INFORMATION_FIELD, BRAND_FIELD, VALUE_FIELD,
    VALUE_TYPE_FIELD,
};
use crate::model::{CatalogKind, FieldDefinition, FieldId, FileHandle, Id, ReconciledField};
use crate::store::{BackofficeApi, Uploader};

/// Key under which attachment URLs are sent
pub const IMAGES_FIELD: &str = "images";

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("attachment upload failed: {0}")]
    Upload(ApiError),
    #[error("saving the property failed: {0}")]
    Api(ApiError),
    #[error("the form was closed")]
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Created { message: Option<String>, data: Value },
    Updated { message: Option<String>, data: Value },
}

/// Free-text companions of a catalog value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldNote {
    AdditionalInformation(String),
    Brand(String),
}

#[derive(Debug, Clone)]
struct CatalogState {
    fields: Vec<ReconciledField>,
    /// Catalog ids the fields were built from
    built_from: Vec<FieldId>,
}

/// In-memory state of one property form, from load to submit
#[derive(Debug, Clone)]
pub struct FormSession {
    entity_id: Option<Id>,
    open: bool,
    record: Map<String, Value>,
    record_loaded: bool,
    catalogs: BTreeMap<CatalogKind, CatalogState>,
    pending_uploads: Vec<FileHandle>,
    image_urls: Vec<String>,
}

impl FormSession {
    /// Session for a property; None means a property being created
    pub fn new(entity_id: Option<Id>) -> Self {
        Self {
            entity_id,
            open: true,
            record: Map::new(),
            record_loaded: false,
            catalogs: BTreeMap::new(),
            pending_uploads: Vec::new(),
            image_urls: Vec::new(),
        }
    }

    pub fn entity_id(&self) -> Option<&Id> {
        self.entity_id.as_ref()
    }

    pub fn is_new(&self) -> bool {
        self.entity_id.is_none()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Mark the form as gone; late loads are discarded afterwards
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Switch the form to another property (or to a new one).
    /// Every catalog is rebuilt on its next initialization.
    pub fn retarget(&mut self, entity_id: Option<Id>) {
        if self.entity_id != entity_id {
            self.entity_id = entity_id;
            self.record.clear();
            self.record_loaded = false;
            self.catalogs.clear();
            self.pending_uploads.clear();
            self.image_urls.clear();
        }
    }

    /// Reconcile a catalog into form fields, once.
    ///
    /// Returns false without touching the fields when this catalog was
    /// already initialized from the same catalog entries, so edits in
    /// progress survive repeated loads.
    pub fn initialize_catalog(
        &mut self,
        kind: CatalogKind,
        catalog: &[FieldDefinition],
        selections: Option<&[Value]>,
    ) -> bool {
        let built_from: Vec<FieldId> = catalog.iter().map(|d| d.id).collect();
        if let Some(state) = self.catalogs.get(&kind) {
            if state.built_from == built_from {
                return false;
            }
        }

        let fields = reconcile(CatalogAdapter::for_kind(kind), catalog, selections, self.is_new());
        self.catalogs.insert(kind, CatalogState { fields, built_from });
        true
    }

    pub fn is_initialized(&self, kind: CatalogKind) -> bool {
        self.catalogs.contains_key(&kind)
    }

    pub fn fields(&self, kind: CatalogKind) -> &[ReconciledField] {
        self.catalogs.get(&kind).map(|s| s.fields.as_slice()).unwrap_or(&[])
    }

    /// Replace a catalog's fields wholesale
    pub fn replace_fields(&mut self, kind: CatalogKind, fields: Vec<ReconciledField>) {
        let built_from = fields.iter().map(|f| f.field_id).collect();
        self.catalogs.insert(kind, CatalogState { fields, built_from });
    }

    fn field_mut(&mut self, kind: CatalogKind, field_id: FieldId) -> Option<&mut ReconciledField> {
        self.catalogs
            .get_mut(&kind)?
            .fields
            .iter_mut()
            .find(|f| f.field_id == field_id)
    }

    pub fn control_for(&self, kind: CatalogKind, field_id: FieldId) -> Option<InputControl> {
        self.fields(kind)
            .iter()
            .find(|f| f.field_id == field_id)
            .map(InputControl::for_field)
    }

    /// Route a user event to a field; returns whether the field accepted it
    pub fn apply_input(&mut self, kind: CatalogKind, field_id: FieldId, event: InputEvent) -> bool {
        let Some(field) = self.field_mut(kind, field_id) else {
            log::debug!("No {} field {} to apply input to", kind, field_id);
            return false;
        };

        match InputControl::for_field(field).accept(event) {
            Some(value) => {
                field.value = value;
                true
            }
            None => false,
        }
    }

    /// Edit the additional information or brand of a field, where the catalog has one
    pub fn set_note(&mut self, kind: CatalogKind, field_id: FieldId, note: FieldNote) -> bool {
        let Some(field) = self.field_mut(kind, field_id) else {
            return false;
        };

        let slot = match note {
            FieldNote::AdditionalInformation(text) => field.additional_information.as_mut().map(|s| (s, text)),
            FieldNote::Brand(text) => field.brand.as_mut().map(|s| (s, text)),
        };
        match slot {
            Some((current, text)) => {
                *current = text;
                true
            }
            None => false,
        }
    }

    pub fn record(&self) -> &Map<String, Value> {
        &self.record
    }

    /// Install the persisted plain fields and attachments, once per property
    pub fn load_record(&mut self, record: Map<String, Value>, image_urls: Vec<String>) -> bool {
        if self.record_loaded {
            return false;
        }
        self.record = record;
        self.image_urls = image_urls;
        self.record_loaded = true;
        true
    }

    pub fn set_record_value(&mut self, key: impl Into<String>, value: Value) {
        self.record.insert(key.into(), value);
    }

    pub fn image_urls(&self) -> &[String] {
        &self.image_urls
    }

    pub fn set_image_urls(&mut self, urls: Vec<String>) {
        self.image_urls = urls;
    }

    pub fn attach(&mut self, file: FileHandle) {
        self.pending_uploads.push(file);
    }

    pub fn pending_uploads(&self) -> &[FileHandle] {
        &self.pending_uploads
    }

    /// Serialize the form to the API wire format
    pub fn build_payload(&self) -> Map<String, Value> {
        let mut payload = self.record.clone();

        for (kind, state) in &self.catalogs {
            let adapter = CatalogAdapter::for_kind(*kind);
            let rows = state.fields.iter().map(|field| selection_row(adapter, field)).collect();
            payload.insert(adapter.collection_key.to_string(), Value::Array(rows));
        }

        // an existing property is replaced whole, so an empty list clears its images
        if !self.image_urls.is_empty() || !self.is_new() {
            payload.insert(IMAGES_FIELD.to_string(), json!(self.image_urls));
        }

        payload
    }

    /// Upload pending attachments, then create or update the property.
    ///
    /// On failure the session keeps every edit so the user can retry.
    pub async fn submit<A, U>(&mut self, api: &A, uploader: &U) -> Result<SubmitOutcome, SubmitError>
    where
        A: BackofficeApi + ?Sized,
        U: Uploader + ?Sized,
    {
        if !self.open {
            return Err(SubmitError::Closed);
        }

        if !self.pending_uploads.is_empty() {
            let urls = uploader
                .upload(self.pending_uploads.clone())
                .await
                .map_err(SubmitError::Upload)?;
            self.image_urls.extend(urls);
            self.pending_uploads.clear();
        }

        let payload = self.build_payload();
        let result = match &self.entity_id {
            Some(id) => api.update_property(id, payload).await.map(|data| SubmitOutcome::Updated {
                message: response_message(&data),
                data,
            }),
            None => api.create_property(payload).await.map(|data| SubmitOutcome::Created {
                message: response_message(&data),
                data,
            }),
        };

        result.map_err(|e| {
            log::warn!("Property submit failed: {}", e);
            SubmitError::Api(e)
        })
    }

    /// JSON view of the reconciled state, for diagnostics
    pub fn snapshot(&self) -> Value {
        let catalogs: Map<String, Value> = self
            .catalogs
            .iter()
            .map(|(kind, state)| (kind.as_str().to_string(), json!(state.fields)))
            .collect();

        json!({
            "entityId": self.entity_id,
            "record": self.record,
            "catalogs": catalogs,
            "images": self.image_urls,
            "pendingUploads": self.pending_uploads.len(),
        })
    }
}

fn selection_row(adapter: &CatalogAdapter, field: &ReconciledField) -> Value {
    let mut row = Map::new();
    row.insert(adapter.id_field.to_string(), json!(field.field_id));
    row.insert(VALUE_FIELD.to_string(), Value::String(field.value.to_wire()));

    if adapter.value_style == ValueStyle::Typed {
        row.insert(VALUE_TYPE_FIELD.to_string(), json!(field.value_type().as_str()));
    }
    if adapter.additional_information {
        let text = field.additional_information.clone().unwrap_or_default();
        row.insert(ADDITIONAL_INFORMATION_FIELD.to_string(), Value::String(text));
    }
    if adapter.brand {
        let text = field.brand.clone().unwrap_or_default();
        row.insert(BRAND_FIELD.to_string(), Value::String(text));
    }

    Value::Object(row)
}
