//! Activity metadata resolution.
//!
//! After a batch is stored, each distinct activity IRI that appeared as a
//! statement object is fetched over HTTP. An IRI that resolves to valid
//! activity metadata enriches the canonical definition; everything else is
//! ignored. The whole path is best-effort and mostly silent, since the
//! typical activity IRI is an opaque identifier that never resolves.

use std::collections::BTreeSet;

use serde_json::{Value, json};
use tracing::{debug, warn};

use openlrs_store::Stores;
use openlrs_types::{ActivityDefinition, StatementId};
use openlrs_validate::validate_activity;

use crate::config::ResolverConfig;
use crate::error::TaskError;

/// HTTP client for activity IRI fetches.
pub struct MetadataResolver {
    client: reqwest::Client,
}

impl MetadataResolver {
    /// Build the resolver from its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::HttpClient`] if the underlying client cannot
    /// be constructed.
    pub fn new(config: &ResolverConfig) -> Result<Self, TaskError> {
        let client = reqwest::Client::builder()
            .timeout(config.resolve_timeout())
            .build()?;
        Ok(Self { client })
    }

    /// Fetch an activity IRI, expecting JSON back.
    ///
    /// Connection failures, non-2xx responses, and non-JSON bodies all
    /// come back as `None`; none of them are worth logging.
    async fn fetch(&self, activity_id: &str) -> Option<Value> {
        let response = self
            .client
            .get(activity_id)
            .header("Accept", "application/json, */*")
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.json().await.ok()
    }
}

/// Resolve metadata for every distinct object activity of a batch.
///
/// Fetches run concurrently; each one either merges into the activity
/// store or is dropped. Nothing here can fail the job.
pub async fn run_metadata_resolution(
    stores: &Stores,
    resolver: &MetadataResolver,
    batch: &[StatementId],
) {
    let activity_ids = object_activity_ids(stores, batch).await;
    let fetches = activity_ids
        .iter()
        .map(|id| resolve_one(stores, resolver, id));
    futures::future::join_all(fetches).await;
}

/// Distinct IRIs appearing as the object of the batch's statements.
async fn object_activity_ids(stores: &Stores, batch: &[StatementId]) -> BTreeSet<String> {
    let mut activity_ids = BTreeSet::new();
    for statement in stores.statements.get_many(batch).await {
        if let Some(id) = statement.object_activity_id() {
            activity_ids.insert(id.to_owned());
        }
    }
    activity_ids
}

/// Fetch one IRI and merge whatever valid metadata comes back.
async fn resolve_one(stores: &Stores, resolver: &MetadataResolver, activity_id: &str) {
    let Some(data) = resolver.fetch(activity_id).await else {
        return;
    };
    // A resolvable IRI with nothing to say is fine.
    match &data {
        Value::Null => return,
        Value::Object(map) if map.is_empty() => return,
        _ => {}
    }

    let wrapper = json!({"id": activity_id, "definition": data});
    if let Err(error) = validate_activity(&wrapper) {
        warn!(activity_id, %error, "Activity metadata retrieval error");
        return;
    }
    let Some(definition) = wrapper
        .get("definition")
        .and_then(ActivityDefinition::from_value)
    else {
        return;
    };
    // Resolution only ever enriches activities ingest already knows.
    if stores
        .activities
        .merge_definition(activity_id, &definition)
        .await
    {
        debug!(activity_id, "Merged resolved activity metadata");
    }
}
