use serde_json::{Map, Value};

use crate::api::{response_message, ApiError};
use crate::logic::changes::compute_changes;
use crate::model::{ChangeSet, Id};
use crate::store::BackofficeApi;

/// Result of saving a simple record form (client, adviser, transaction...)
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// Nothing differed from the loaded record; no request was made
    NoChanges,
    Updated { changes: ChangeSet, message: Option<String> },
}

impl UpdateOutcome {
    pub fn is_noop(&self) -> bool {
        matches!(self, UpdateOutcome::NoChanges)
    }
}

/// What a save would send, without sending it
pub fn plan_update(edited: &Map<String, Value>, loaded: &Map<String, Value>) -> Option<(ChangeSet, Map<String, Value>)> {
    let changes = compute_changes(edited, loaded);
    if changes.is_empty() {
        return None;
    }
    let payload = changes.apply_to(loaded);
    Some((changes, payload))
}

/// Save an edited record if anything changed
pub async fn submit_update<A>(
    api: &A,
    resource: &str,
    id: &Id,
    edited: &Map<String, Value>,
    loaded: &Map<String, Value>,
) -> Result<UpdateOutcome, ApiError>
where
    A: BackofficeApi + ?Sized,
{
    let Some((changes, payload)) = plan_update(edited, loaded) else {
        log::info!("No changes detected for {} {}", resource, id);
        return Ok(UpdateOutcome::NoChanges);
    };

    log::info!(
        "Updating {} {} ({} changed field(s))",
        resource,
        id,
        changes.len()
    );
    let data = api.patch_record(resource, id, payload).await?;

    Ok(UpdateOutcome::Updated {
        changes,
        message: response_message(&data),
    })
}
