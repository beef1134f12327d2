//! HTTP endpoint handlers for statement ingest and hook management.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/xapi/statements` | Store one statement or a batch |
//! | `GET` | `/xapi/statements/{id}` | Fetch a stored statement verbatim |
//! | `GET` | `/xapi/hooks` | List registered hooks |
//! | `POST` | `/xapi/hooks` | Register a hook |
//! | `GET` | `/xapi/hooks/{id}` | Fetch one hook |
//! | `PUT` | `/xapi/hooks/{id}` | Register or replace a hook |
//! | `DELETE` | `/xapi/hooks/{id}` | Remove a hook |
//! | `GET` | `/about` | Server version and feature flags |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};
use uuid::Uuid;

use openlrs_store::StoreError;
use openlrs_tasks::Job;
use openlrs_types::{
    ActivityDefinition, Hook, HookConfig, HookId, StatementId, StoredStatement, identified_actors,
};
use openlrs_validate::validate_statement;

use crate::error::ApiError;
use crate::state::AppState;
use crate::version::XAPI_VERSION;

// ---------------------------------------------------------------------------
// POST /xapi/statements -- store one statement or a batch
// ---------------------------------------------------------------------------

/// Store one statement object or an array of them.
///
/// Every document is validated before anything is stored; the first
/// violation rejects the whole submission with nothing written. Ids are
/// assigned where the client sent none, and an id collision (within the
/// batch or against the store) rejects the batch whole. On success the
/// body is the JSON array of stored ids in submission order, and the
/// background jobs for the batch are queued.
pub async fn store_statements(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let submitted: Vec<Value> = match body {
        Value::Array(items) => items,
        single @ Value::Object(_) => vec![single],
        other => {
            return Err(ApiError::BadRequest(format!(
                "statement payload must be an object or an array, got {}",
                json_type_name(&other)
            )));
        }
    };
    if submitted.is_empty() {
        return Err(ApiError::BadRequest(
            "statement array must not be empty".to_owned(),
        ));
    }

    for statement in &submitted {
        validate_statement(statement)?;
    }

    let stored_at = Utc::now();
    let mut batch = Vec::with_capacity(submitted.len());
    let mut documents = Vec::with_capacity(submitted.len());
    let mut ids = Vec::with_capacity(submitted.len());
    let mut void_targets = Vec::new();
    for mut value in submitted {
        let record = finalize_statement(&mut value, stored_at)?;
        if let Some(target) = record.voiding_target() {
            void_targets.push(target);
        }
        ids.push(record.id);
        batch.push(record);
        documents.push(value);
    }

    state
        .stores
        .statements
        .insert_batch(batch)
        .await
        .map_err(|error| match error {
            StoreError::DuplicateStatement(id) => ApiError::DuplicateStatement(id.to_string()),
            other => ApiError::Internal(other.to_string()),
        })?;

    register_mentions(&state, &ids, &documents).await;

    state.jobs.enqueue(Job::StatementsStored { batch: ids.clone() });
    if !void_targets.is_empty() {
        state.jobs.enqueue(Job::VoidTargets {
            targets: void_targets,
        });
    }

    let id_strings: Vec<String> = ids.iter().map(ToString::to_string).collect();
    Ok(Json(json!(id_strings)))
}

/// Assign storage fields to a validated document and build its projection.
///
/// Sets `id` (kept when the client sent one), `stored`, and defaults for
/// `timestamp` and `version`. The serialization taken here is the one the
/// statement keeps for its lifetime.
fn finalize_statement(
    value: &mut Value,
    stored_at: DateTime<Utc>,
) -> Result<StoredStatement, ApiError> {
    let id = match value.get("id").and_then(Value::as_str) {
        Some(raw) => StatementId::from(Uuid::parse_str(raw).map_err(|error| {
            ApiError::Internal(format!("validated statement id failed to parse: {error}"))
        })?),
        None => StatementId::new(),
    };

    let stored_string = stored_at.to_rfc3339_opts(SecondsFormat::Millis, true);
    if let Some(map) = value.as_object_mut() {
        map.insert("id".to_owned(), json!(id.to_string()));
        map.insert("stored".to_owned(), json!(stored_string));
        map.entry("timestamp")
            .or_insert_with(|| json!(stored_string));
        map.entry("version").or_insert_with(|| json!(XAPI_VERSION));
    }

    let document = value.to_string();
    StoredStatement::from_document(id, stored_at, value, document).ok_or_else(|| {
        ApiError::Internal("validated statement lost required fields during storage".to_owned())
    })
}

/// Register the agents and activities a stored batch mentioned.
///
/// Actors become rows hook filters can resolve against; every related
/// activity IRI gets a store entry, and object activities carrying an
/// inline definition enrich it.
async fn register_mentions(state: &AppState, ids: &[StatementId], documents: &[Value]) {
    for statement in state.stores.statements.get_many(ids).await {
        for activity_id in statement.related_activity_ids() {
            state.stores.activities.upsert(activity_id, None).await;
        }
    }
    for document in documents {
        for agent in identified_actors(document) {
            state.stores.agents.register(agent).await;
        }
        if let Some(object) = document.get("object")
            && object
                .get("objectType")
                .and_then(Value::as_str)
                .unwrap_or("Activity")
                == "Activity"
            && let Some(id) = object.get("id").and_then(Value::as_str)
            && let Some(definition) = object
                .get("definition")
                .and_then(ActivityDefinition::from_value)
        {
            state.stores.activities.upsert(id, Some(&definition)).await;
        }
    }
}

// ---------------------------------------------------------------------------
// GET /xapi/statements/{id} -- fetch a stored statement verbatim
// ---------------------------------------------------------------------------

/// Return the stored document exactly as it was serialized at storage
/// time. Voided statements are indistinguishable from unknown ones.
pub async fn get_statement(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = StatementId::from(parse_uuid(&id_str)?);
    let statement = state
        .stores
        .statements
        .get(id)
        .await
        .filter(|statement| !statement.voided)
        .ok_or_else(|| ApiError::NotFound(format!("statement {id_str}")))?;

    Ok((
        [(header::CONTENT_TYPE, "application/json")],
        statement.document.clone(),
    ))
}

// ---------------------------------------------------------------------------
// Hook management
// ---------------------------------------------------------------------------

/// Register a hook with a server-assigned id (unless the body names one).
pub async fn create_hook(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let hook = parse_hook_body(None, &body)?;
    state.stores.hooks.put(hook.clone()).await;
    Ok((StatusCode::CREATED, Json(hook_json(&hook))))
}

/// Register or replace the hook at a client-chosen id.
pub async fn put_hook(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let id = HookId::from(parse_uuid(&id_str)?);
    let hook = parse_hook_body(Some(id), &body)?;
    let created = state.stores.hooks.put(hook.clone()).await;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(hook_json(&hook))))
}

/// List every registered hook.
pub async fn list_hooks(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let hooks: Vec<Value> = state
        .stores
        .hooks
        .list()
        .await
        .iter()
        .map(hook_json)
        .collect();
    Json(json!({
        "count": hooks.len(),
        "hooks": hooks,
    }))
}

/// Fetch one hook by id.
pub async fn get_hook(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = HookId::from(parse_uuid(&id_str)?);
    let hook = state
        .stores
        .hooks
        .get(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("hook {id_str}")))?;
    Ok(Json(hook_json(&hook)))
}

/// Remove a hook. Removal takes effect on the next dispatch round.
pub async fn delete_hook(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = HookId::from(parse_uuid(&id_str)?);
    if state.stores.hooks.delete(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("hook {id_str}")))
    }
}

/// Parse and check a hook registration body.
///
/// `filters` may be absent (a hook that wants everything); `config` must
/// parse, which above all means an `endpoint` is present. Broken filter
/// documents are accepted here and surface per-hook at dispatch time.
fn parse_hook_body(id: Option<HookId>, body: &Value) -> Result<Hook, ApiError> {
    let map = body
        .as_object()
        .ok_or_else(|| ApiError::BadRequest("hook body must be an object".to_owned()))?;

    let id = match id {
        Some(id) => id,
        None => match map.get("id").and_then(Value::as_str) {
            Some(raw) => HookId::from(
                Uuid::parse_str(raw)
                    .map_err(|error| ApiError::InvalidId(format!("hook id: {error}")))?,
            ),
            None => HookId::new(),
        },
    };

    let filters = map.get("filters").cloned().unwrap_or_else(|| json!({}));
    let config = map
        .get("config")
        .cloned()
        .ok_or_else(|| ApiError::BadRequest("hook config is required".to_owned()))?;
    HookConfig::from_value(&config)
        .map_err(|error| ApiError::BadRequest(format!("invalid hook config: {error}")))?;

    Ok(Hook { id, filters, config })
}

fn hook_json(hook: &Hook) -> Value {
    json!({
        "id": hook.id.to_string(),
        "filters": hook.filters,
        "config": hook.config,
    })
}

// ---------------------------------------------------------------------------
// GET /about -- server version and feature flags
// ---------------------------------------------------------------------------

/// Version and feature discovery. Served without version negotiation so
/// clients can find out what to send.
pub async fn about() -> impl IntoResponse {
    Json(json!({
        "version": [XAPI_VERSION],
        "features": {
            "statement_hooks": true,
            "activity_metadata_resolution": true,
        }
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_uuid(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|error| ApiError::InvalidId(format!("{raw}: {error}")))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
