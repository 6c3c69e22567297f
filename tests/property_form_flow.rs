use parking_lot::Mutex;
use realty_forms::{
    submit_update, ApiError, BackofficeApi, CatalogKind, FieldDefinition, FieldNote, FieldValue, FileHandle,
    FormSession, Id, InputEvent, PropertyFormLoader, SubmitError, SubmitOutcome, UpdateOutcome, Uploader,
};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

// In-memory back-office standing in for the REST API
#[derive(Default)]
struct FakeBackoffice {
    catalogs: HashMap<CatalogKind, Vec<FieldDefinition>>,
    failing_catalogs: Vec<CatalogKind>,
    properties: HashMap<Id, Map<String, Value>>,
    reject_writes: Option<String>,
    writes: Mutex<Vec<(String, Map<String, Value>)>>,
}

impl FakeBackoffice {
    fn with_catalog(mut self, kind: CatalogKind, catalog: Vec<FieldDefinition>) -> Self {
        self.catalogs.insert(kind, catalog);
        self
    }

    fn with_property(mut self, id: &str, record: Value) -> Self {
        self.properties
            .insert(id.to_string(), record.as_object().cloned().unwrap_or_default());
        self
    }

    fn writes(&self) -> Vec<(String, Map<String, Value>)> {
        self.writes.lock().clone()
    }

    fn record_write(&self, target: String, payload: Map<String, Value>) -> Result<Value, ApiError> {
        if let Some(message) = &self.reject_writes {
            return Err(ApiError::Status {
                status: 422,
                message: message.clone(),
            });
        }
        self.writes.lock().push((target, payload));
        Ok(json!({"message": "Saved"}))
    }
}

#[async_trait::async_trait]
impl BackofficeApi for FakeBackoffice {
    async fn fetch_catalog(&self, kind: CatalogKind) -> Result<Vec<FieldDefinition>, ApiError> {
        if self.failing_catalogs.contains(&kind) {
            return Err(ApiError::Status {
                status: 500,
                message: "catalog unavailable".to_string(),
            });
        }
        Ok(self.catalogs.get(&kind).cloned().unwrap_or_default())
    }

    async fn fetch_property(&self, id: &Id) -> Result<Map<String, Value>, ApiError> {
        self.properties.get(id).cloned().ok_or_else(|| ApiError::Status {
            status: 404,
            message: format!("Property {} not found", id),
        })
    }

    async fn create_property(&self, payload: Map<String, Value>) -> Result<Value, ApiError> {
        self.record_write("POST /properties".to_string(), payload)
    }

    async fn update_property(&self, id: &Id, payload: Map<String, Value>) -> Result<Value, ApiError> {
        self.record_write(format!("PUT /properties/{}", id), payload)
    }

    async fn patch_record(&self, resource: &str, id: &Id, payload: Map<String, Value>) -> Result<Value, ApiError> {
        self.record_write(format!("PATCH /{}/{}", resource, id), payload)
    }
}

#[derive(Default)]
struct FakeUploader {
    fail: bool,
    uploaded: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl Uploader for FakeUploader {
    async fn upload(&self, files: Vec<FileHandle>) -> Result<Vec<String>, ApiError> {
        if self.fail {
            return Err(ApiError::Status {
                status: 413,
                message: "File too large".to_string(),
            });
        }
        let urls: Vec<String> = files.iter().map(|f| format!("https://cdn.test/{}", f.name)).collect();
        self.uploaded.lock().extend(urls.iter().cloned());
        Ok(urls)
    }
}

fn pool_backoffice() -> FakeBackoffice {
    FakeBackoffice::default()
        .with_catalog(
            CatalogKind::Attributes,
            vec![serde_json::from_value(json!({"id": 1, "formType": "check", "label": "Pool"})).unwrap()],
        )
        .with_property(
            "7",
            json!({
                "id": 7,
                "title": "Casa Azul",
                "price": 250000,
                "attributes": [{"attributeId": 1, "value": "true"}],
                "images": ["https://cdn.test/front.jpg"]
            }),
        )
}

#[tokio::test]
async fn test_attribute_edit_end_to_end() {
    let api = pool_backoffice();
    let uploader = FakeUploader::default();

    let mut session = PropertyFormLoader::new(&api).load(Some(&"7".to_string())).await.unwrap();
    let fields = session.fields(CatalogKind::Attributes);
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].field_id, 1);
    assert_eq!(fields[0].value, FieldValue::Boolean(true));

    // user unchecks the pool
    assert!(session.apply_input(CatalogKind::Attributes, 1, InputEvent::Toggled(false)));

    let outcome = session.submit(&api, &uploader).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Updated { message: Some(ref m), .. } if m == "Saved"));

    let writes = api.writes();
    assert_eq!(writes.len(), 1);
    let (target, payload) = &writes[0];
    assert_eq!(target, "PUT /properties/7");
    assert_eq!(payload["attributes"][0]["value"], "false");
    assert_eq!(payload["attributes"][0]["attributeId"], 1);
    assert_eq!(payload["title"], "Casa Azul");
    assert_eq!(payload["images"], json!(["https://cdn.test/front.jpg"]));
}

#[tokio::test]
async fn test_unsupported_kind_loads_and_submits() {
    let api = FakeBackoffice::default().with_catalog(
        CatalogKind::Attributes,
        vec![
            serde_json::from_value(json!({"id": 1, "formType": "slider", "label": "Light"})).unwrap(),
            serde_json::from_value(json!({"id": 2, "formType": "text", "label": "Street"})).unwrap(),
        ],
    );
    let uploader = FakeUploader::default();

    let mut session = PropertyFormLoader::new(&api).load(None).await.unwrap();
    let control = session.control_for(CatalogKind::Attributes, 1).unwrap();
    assert_eq!(control.placeholder_text().as_deref(), Some("Unsupported field type: slider"));
    assert!(!session.apply_input(CatalogKind::Attributes, 1, InputEvent::Typed("5".to_string())));
    assert!(session.apply_input(CatalogKind::Attributes, 2, InputEvent::Typed("Av. Sur 120".to_string())));

    let outcome = session.submit(&api, &uploader).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Created { .. }));

    let (target, payload) = &api.writes()[0];
    assert_eq!(target, "POST /properties");
    assert_eq!(payload["attributes"][0], json!({"attributeId": 1, "value": "", "valueType": "string"}));
    assert_eq!(payload["attributes"][1]["value"], "Av. Sur 120");
}

#[tokio::test]
async fn test_every_catalog_reconciled_with_orphans_dropped() {
    let api = FakeBackoffice::default()
        .with_catalog(
            CatalogKind::Distributions,
            vec![FieldDefinition::new(1, "Living"), FieldDefinition::new(3, "Kitchen")],
        )
        .with_catalog(CatalogKind::Equipment, vec![FieldDefinition::new(4, "Oven")])
        .with_catalog(CatalogKind::Utilities, vec![FieldDefinition::new(5, "Gas")])
        .with_catalog(CatalogKind::Adjacencies, vec![FieldDefinition::new(6, "Park")])
        .with_property(
            "9",
            json!({
                "id": 9,
                "distributions": [
                    {"distributionId": 3, "value": "true", "additionalInformation": "note"},
                    {"distributionId": 77, "value": "true"}
                ],
                "equipments": [{"equipmentId": 4, "value": "true", "brand": "Teka"}],
                "utilities": "malformed",
                "adjacencies": [{"adjacencyId": 6, "value": "true"}, 12]
            }),
        );

    let session = PropertyFormLoader::new(&api).load(Some(&"9".to_string())).await.unwrap();

    let distributions = session.fields(CatalogKind::Distributions);
    assert_eq!(distributions.len(), 2);
    assert_eq!(distributions[1].value, FieldValue::Boolean(true));
    assert_eq!(distributions[1].additional_information.as_deref(), Some("note"));

    assert_eq!(session.fields(CatalogKind::Equipment)[0].brand.as_deref(), Some("Teka"));
    assert_eq!(session.fields(CatalogKind::Utilities)[0].value, FieldValue::Boolean(false));
    // one unreadable selection defaults the whole catalog
    assert_eq!(session.fields(CatalogKind::Adjacencies)[0].value, FieldValue::Boolean(false));

    // nested selections are not kept as plain record fields
    assert!(session.record().get("distributions").is_none());
    assert_eq!(session.record().get("id"), Some(&json!(9)));
}

#[tokio::test]
async fn test_catalog_failure_shows_no_fields() {
    let mut api = pool_backoffice();
    api.failing_catalogs.push(CatalogKind::Attributes);

    let session = PropertyFormLoader::new(&api).load(Some(&"7".to_string())).await.unwrap();
    assert!(session.fields(CatalogKind::Attributes).is_empty());
    assert!(session.is_initialized(CatalogKind::Attributes));
}

#[tokio::test]
async fn test_missing_property_is_an_error() {
    let api = pool_backoffice();
    let err = PropertyFormLoader::new(&api)
        .load(Some(&"404".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_reload_keeps_edits() {
    let api = pool_backoffice();
    let loader = PropertyFormLoader::new(&api);
    let mut session = loader.load(Some(&"7".to_string())).await.unwrap();

    session.apply_input(CatalogKind::Attributes, 1, InputEvent::Toggled(false));
    session.set_record_value("title", json!("Casa Roja"));

    assert!(loader.load_into(&mut session).await.unwrap());
    assert_eq!(session.fields(CatalogKind::Attributes)[0].value, FieldValue::Boolean(false));
    assert_eq!(session.record()["title"], "Casa Roja");
}

#[tokio::test]
async fn test_closed_form_discards_late_load() {
    let api = pool_backoffice();
    let loader = PropertyFormLoader::new(&api);
    let mut session = FormSession::new(Some("7".to_string()));

    let entity_id = session.entity_id().cloned();
    let in_flight = loader.fetch(entity_id.as_ref());
    session.close();
    let loaded = in_flight.await.unwrap();

    assert!(!loaded.apply_to(&mut session));
    assert!(!session.is_initialized(CatalogKind::Attributes));
    assert!(session.record().is_empty());

    let err = session.submit(&api, &FakeUploader::default()).await.unwrap_err();
    assert!(matches!(err, SubmitError::Closed));
}

#[tokio::test]
async fn test_retargeted_form_discards_stale_load() {
    let api = pool_backoffice().with_property("8", json!({"title": "Depto Azul", "attributes": []}));
    let loader = PropertyFormLoader::new(&api);
    let mut session = FormSession::new(Some("7".to_string()));

    let first_id = "7".to_string();
    let in_flight = loader.fetch(Some(&first_id));
    session.retarget(Some("8".to_string()));
    let stale = in_flight.await.unwrap();

    assert_eq!(stale.entity_id(), Some(&"7".to_string()));
    assert!(!stale.apply_to(&mut session));
    assert!(session.record().is_empty());

    assert!(loader.load_into(&mut session).await.unwrap());
    assert_eq!(session.record()["title"], "Depto Azul");
}

#[tokio::test]
async fn test_uploads_finish_before_payload() {
    let api = pool_backoffice();
    let uploader = FakeUploader::default();
    let mut session = PropertyFormLoader::new(&api).load(Some(&"7".to_string())).await.unwrap();

    session.attach(FileHandle::new("kitchen.jpg", vec![1, 2, 3]).with_content_type("image/jpeg"));
    session.submit(&api, &uploader).await.unwrap();

    assert!(session.pending_uploads().is_empty());
    let (_, payload) = &api.writes()[0];
    assert_eq!(
        payload["images"],
        json!(["https://cdn.test/front.jpg", "https://cdn.test/kitchen.jpg"])
    );
}

#[tokio::test]
async fn test_failed_submit_keeps_edits() {
    let mut api = pool_backoffice();
    api.reject_writes = Some("Price is required".to_string());
    let failing_uploader = FakeUploader {
        fail: true,
        ..FakeUploader::default()
    };

    let mut session = PropertyFormLoader::new(&api).load(Some(&"7".to_string())).await.unwrap();
    session.apply_input(CatalogKind::Attributes, 1, InputEvent::Toggled(false));
    session.attach(FileHandle::new("huge.png", vec![0; 16]));

    let err = session.submit(&api, &failing_uploader).await.unwrap_err();
    assert!(matches!(err, SubmitError::Upload(_)));
    assert_eq!(session.pending_uploads().len(), 1);

    let err = session.submit(&api, &FakeUploader::default()).await.unwrap_err();
    match err {
        SubmitError::Api(e) => assert_eq!(e.user_message(), "Price is required"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(session.fields(CatalogKind::Attributes)[0].value, FieldValue::Boolean(false));
    assert!(api.writes().is_empty());
}

#[tokio::test]
async fn test_notes_round_trip_into_payload() {
    let api = FakeBackoffice::default().with_catalog(CatalogKind::Equipment, vec![FieldDefinition::new(4, "Oven")]);
    let mut session = PropertyFormLoader::new(&api).load(None).await.unwrap();

    session.apply_input(CatalogKind::Equipment, 4, InputEvent::Toggled(true));
    session.set_note(CatalogKind::Equipment, 4, FieldNote::Brand("Teka".to_string()));
    session.set_note(CatalogKind::Equipment, 4, FieldNote::AdditionalInformation("Gas oven".to_string()));
    session.submit(&api, &FakeUploader::default()).await.unwrap();

    let (_, payload) = &api.writes()[0];
    assert_eq!(
        payload["equipments"],
        json!([{"equipmentId": 4, "value": "true", "brand": "Teka", "additionalInformation": "Gas oven"}])
    );
}

#[tokio::test]
async fn test_simple_update_skips_noop_and_patches_changes() {
    let api = FakeBackoffice::default();
    let loaded = json!({"id": 3, "name": "Ana Ruiz", "budget": 2500, "phone": "5551234"});
    let loaded = loaded.as_object().unwrap();

    let unchanged = json!({"name": "Ana Ruiz", "budget": "2500.00"});
    let outcome = submit_update(&api, "clients", &"3".to_string(), unchanged.as_object().unwrap(), loaded)
        .await
        .unwrap();
    assert!(outcome.is_noop());
    assert!(api.writes().is_empty());

    let edited = json!({"name": "Ana Ruiz", "budget": ""});
    let outcome = submit_update(&api, "clients", &"3".to_string(), edited.as_object().unwrap(), loaded)
        .await
        .unwrap();
    match outcome {
        UpdateOutcome::Updated { changes, message } => {
            assert_eq!(changes.fields().collect::<Vec<_>>(), vec!["budget"]);
            assert_eq!(message.as_deref(), Some("Saved"));
        }
        UpdateOutcome::NoChanges => panic!("expected an update"),
    }

    let (target, payload) = &api.writes()[0];
    assert_eq!(target, "PATCH /clients/3");
    assert_eq!(payload["budget"], "");
    assert_eq!(payload["phone"], "5551234");
}
