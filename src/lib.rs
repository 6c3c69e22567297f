pub mod api;
pub mod config;
pub mod logic;
pub mod model;
pub mod store;

// Export HTTP collaborator types
pub use api::{ApiError, HttpBackofficeClient, HttpUploader};

// Export logic types
pub use logic::{
    compute_changes, compute_record_changes, plan_update, reconcile, submit_update, CatalogAdapter, FieldNote,
    FormSession, InputControl, InputEvent, LoadedForm, PropertyFormLoader, SubmitError, SubmitOutcome, UpdateOutcome,
    ValueStyle,
};

// Export all model types
pub use model::*;

// Export store types
pub use store::{BackofficeApi, CachedEntry, ResponseCache, Uploader};

/// Load a property form and print its reconciled state as JSON
pub async fn run_inspect(entity_id: Option<Id>) -> anyhow::Result<()> {
    use std::sync::Arc;

    let config = crate::config::AppConfig::load()?;
    log::info!("Using back-office API at {}", config.api.base_url);

    let cache = Arc::new(ResponseCache::new(config.cache_ttl()));
    let client = HttpBackofficeClient::new(&config.api, cache)?;

    let session = PropertyFormLoader::new(&client).load(entity_id.as_ref()).await?;
    for kind in CatalogKind::ALL {
        for field in session.fields(kind) {
            if let Some(text) = InputControl::for_field(field).placeholder_text() {
                log::warn!("{} field {} ({}): {}", kind, field.field_id, field.label, text);
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
    Ok(())
}
