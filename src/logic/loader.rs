use serde_json::{Map, Value};

use crate::api::ApiError;
use crate::logic::reconcile::CatalogAdapter;
use crate::logic::session::{FormSession, IMAGES_FIELD};
use crate::model::{CatalogKind, FieldDefinition, Id};
use crate::store::BackofficeApi;

/// Fetches catalogs and the edited property, and builds a form session from them
pub struct PropertyFormLoader<'a, A: BackofficeApi + ?Sized> {
    api: &'a A,
}

impl<'a, A: BackofficeApi + ?Sized> PropertyFormLoader<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// A catalog that cannot be fetched is treated as empty
    pub async fn fetch_catalog(&self, kind: CatalogKind) -> Vec<FieldDefinition> {
        match self.api.fetch_catalog(kind).await {
            Ok(catalog) => catalog,
            Err(e) => {
                log::warn!("Could not load {} catalog, showing no fields: {}", kind, e);
                Vec::new()
            }
        }
    }

    /// Fresh session for a property (`None` to create one)
    pub async fn load(&self, entity_id: Option<&Id>) -> Result<FormSession, ApiError> {
        let mut session = FormSession::new(entity_id.cloned());
        self.fetch(entity_id).await?.apply_to(&mut session);
        Ok(session)
    }

    /// Fetch everything a form needs without touching any session.
    ///
    /// The result is applied later with [`LoadedForm::apply_to`], so the form
    /// can be closed or retargeted while the requests are in flight.
    pub async fn fetch(&self, entity_id: Option<&Id>) -> Result<LoadedForm, ApiError> {
        let record = match entity_id {
            Some(id) => Some(self.api.fetch_property(id).await?),
            None => None,
        };

        let mut catalogs = Vec::with_capacity(CatalogKind::ALL.len());
        for kind in CatalogKind::ALL {
            catalogs.push((kind, self.fetch_catalog(kind).await));
        }

        Ok(LoadedForm {
            entity_id: entity_id.cloned(),
            record,
            catalogs,
        })
    }

    /// Fetch and apply in one step, for callers that own the session outright
    pub async fn load_into(&self, session: &mut FormSession) -> Result<bool, ApiError> {
        let entity_id = session.entity_id().cloned();
        let loaded = self.fetch(entity_id.as_ref()).await?;
        Ok(loaded.apply_to(session))
    }
}

/// Property record and catalogs as fetched, not yet applied to a form
#[derive(Debug, Clone)]
pub struct LoadedForm {
    entity_id: Option<Id>,
    record: Option<Map<String, Value>>,
    catalogs: Vec<(CatalogKind, Vec<FieldDefinition>)>,
}

impl LoadedForm {
    pub fn entity_id(&self) -> Option<&Id> {
        self.entity_id.as_ref()
    }

    /// Populate `session` with the fetched data.
    ///
    /// Returns false, leaving the session untouched, when it was closed or
    /// now edits a different property than the one that was fetched.
    pub fn apply_to(self, session: &mut FormSession) -> bool {
        if !session.is_open() {
            log::debug!("Form closed before load finished; discarding results");
            return false;
        }
        if session.entity_id() != self.entity_id.as_ref() {
            log::debug!(
                "Form moved to {:?} while {:?} was loading; discarding results",
                session.entity_id(),
                self.entity_id
            );
            return false;
        }

        for (kind, catalog) in &self.catalogs {
            let adapter = CatalogAdapter::for_kind(*kind);
            let selections = self
                .record
                .as_ref()
                .and_then(|r| selection_list(r, adapter.collection_key));
            session.initialize_catalog(*kind, catalog, selections);
        }

        if let Some(mut record) = self.record {
            let images = image_list(record.remove(IMAGES_FIELD));
            for kind in CatalogKind::ALL {
                record.remove(CatalogAdapter::for_kind(kind).collection_key);
            }
            session.load_record(record, images);
        }

        true
    }
}

fn selection_list<'r>(record: &'r Map<String, Value>, key: &str) -> Option<&'r [Value]> {
    match record.get(key) {
        Some(Value::Array(items)) => Some(items.as_slice()),
        None | Some(Value::Null) => None,
        Some(_) => {
            log::warn!("Property field `{}` is not a list; using defaults", key);
            None
        }
    }
}

fn image_list(images: Option<Value>) -> Vec<String> {
    match images {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(url) => Some(url),
                Value::Object(mut map) => map.remove("url").and_then(|u| u.as_str().map(str::to_string)),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
