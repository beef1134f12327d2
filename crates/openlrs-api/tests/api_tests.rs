//! Integration tests for the LRS API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. This validates handler logic, routing, and
//! version negotiation without needing a live network connection.

#![allow(clippy::unwrap_used)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::routing::post;
use openlrs_api::router::build_router;
use openlrs_api::state::AppState;
use openlrs_store::Stores;
use openlrs_tasks::{TasksConfig, spawn_worker};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

async fn make_test_state() -> Arc<AppState> {
    let stores = Stores::new();
    let (jobs, _worker) = spawn_worker(stores.clone(), &TasksConfig::default()).unwrap();
    Arc::new(AppState::new(stores, jobs))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn xapi_get(path: &str) -> Request<Body> {
    Request::get(path)
        .header("X-Experience-API-Version", "1.0.3")
        .body(Body::empty())
        .unwrap()
}

fn xapi_post(path: &str, body: &Value) -> Request<Body> {
    Request::post(path)
        .header("X-Experience-API-Version", "1.0.3")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn xapi_put(path: &str, body: &Value) -> Request<Body> {
    Request::put(path)
        .header("X-Experience-API-Version", "1.0.3")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn xapi_delete(path: &str) -> Request<Body> {
    Request::delete(path)
        .header("X-Experience-API-Version", "1.0.3")
        .body(Body::empty())
        .unwrap()
}

fn valid_statement() -> Value {
    json!({
        "actor": {"mbox": "mailto:sam@example.com"},
        "verb": {"id": "http://adlnet.gov/expapi/verbs/completed"},
        "object": {"id": "https://example.com/course/1"}
    })
}

fn hook_body() -> Value {
    json!({
        "filters": {"verb": [{"id": "http://adlnet.gov/expapi/verbs/completed"}]},
        "config": {"endpoint": "https://hooks.example.com/sink", "content_type": "json"}
    })
}

// =========================================================================
// Version negotiation
// =========================================================================

#[tokio::test]
async fn test_statements_require_version_header() {
    let state = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(
            Request::post("/xapi/statements")
                .header("content-type", "application/json")
                .body(Body::from(valid_statement().to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unsupported_version_is_rejected() {
    let state = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(
            Request::post("/xapi/statements")
                .header("X-Experience-API-Version", "0.95")
                .header("content-type", "application/json")
                .body(Body::from(valid_statement().to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_every_response_is_version_stamped() {
    let state = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/about").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let stamped = response
        .headers()
        .get("X-Experience-API-Version")
        .unwrap()
        .to_str()
        .unwrap();
    assert_eq!(stamped, "1.0.3");
}

// =========================================================================
// Statement storage and retrieval
// =========================================================================

#[tokio::test]
async fn test_store_single_statement_and_fetch_verbatim() {
    let state = make_test_state().await;
    let router = build_router(state);

    let response = router
        .clone()
        .oneshot(xapi_post("/xapi/statements", &valid_statement()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let ids = body_to_json(response.into_body()).await;
    assert_eq!(ids.as_array().unwrap().len(), 1);
    let id = ids[0].as_str().unwrap().to_owned();

    let response = router
        .oneshot(xapi_get(&format!("/xapi/statements/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("application/json"));

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["id"], id.as_str());
    assert_eq!(json["actor"]["mbox"], "mailto:sam@example.com");
    assert_eq!(json["verb"]["id"], "http://adlnet.gov/expapi/verbs/completed");
    assert_eq!(json["version"], "1.0.3");
    assert!(json["stored"].is_string());
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_client_supplied_id_is_kept() {
    let state = make_test_state().await;
    let router = build_router(state);

    let id = Uuid::new_v4().to_string();
    let mut statement = valid_statement();
    statement["id"] = json!(id);

    let response = router
        .oneshot(xapi_post("/xapi/statements", &statement))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let ids = body_to_json(response.into_body()).await;
    assert_eq!(ids[0], id.as_str());
}

#[tokio::test]
async fn test_batch_returns_ids_in_submission_order() {
    let state = make_test_state().await;
    let router = build_router(state);

    let first_id = Uuid::new_v4().to_string();
    let mut first = valid_statement();
    first["id"] = json!(first_id);
    let batch = json!([first, valid_statement()]);

    let response = router
        .oneshot(xapi_post("/xapi/statements", &batch))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let ids = body_to_json(response.into_body()).await;
    assert_eq!(ids.as_array().unwrap().len(), 2);
    assert_eq!(ids[0], first_id.as_str());
}

#[tokio::test]
async fn test_invalid_statement_rejects_whole_batch() {
    let state = make_test_state().await;
    let router = build_router(state);

    let good_id = Uuid::new_v4().to_string();
    let mut good = valid_statement();
    good["id"] = json!(good_id);
    let bad = json!({
        "actor": {"mbox": "mailto:sam@example.com"},
        "object": {"id": "https://example.com/course/1"}
    });

    let response = router
        .clone()
        .oneshot(xapi_post("/xapi/statements", &json!([good, bad])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The valid statement must not have been stored either.
    let response = router
        .oneshot(xapi_get(&format!("/xapi/statements/{good_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_id_in_batch_is_a_conflict() {
    let state = make_test_state().await;
    let router = build_router(state);

    let id = Uuid::new_v4().to_string();
    let mut first = valid_statement();
    first["id"] = json!(id);
    let mut second = valid_statement();
    second["id"] = json!(id);

    let response = router
        .clone()
        .oneshot(xapi_post("/xapi/statements", &json!([first, second])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = router
        .oneshot(xapi_get(&format!("/xapi/statements/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_id_against_store_is_a_conflict() {
    let state = make_test_state().await;
    let router = build_router(state);

    let id = Uuid::new_v4().to_string();
    let mut statement = valid_statement();
    statement["id"] = json!(id);

    let response = router
        .clone()
        .oneshot(xapi_post("/xapi/statements", &statement))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(xapi_post("/xapi/statements", &statement))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_statement_payload_must_be_object_or_array() {
    let state = make_test_state().await;
    let router = build_router(state);

    let response = router
        .clone()
        .oneshot(xapi_post("/xapi/statements", &json!(42)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = router
        .oneshot(xapi_post("/xapi/statements", &json!([])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_statement_invalid_uuid() {
    let state = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(xapi_get("/xapi/statements/not-a-uuid"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_statement_unknown_returns_404() {
    let state = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(xapi_get(&format!("/xapi/statements/{}", Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_voiding_hides_the_target_statement() {
    let state = make_test_state().await;
    let router = build_router(state);

    let target_id = Uuid::new_v4().to_string();
    let mut target = valid_statement();
    target["id"] = json!(target_id);
    let response = router
        .clone()
        .oneshot(xapi_post("/xapi/statements", &target))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let voiding = json!({
        "actor": {"mbox": "mailto:admin@example.com"},
        "verb": {"id": "http://adlnet.gov/expapi/verbs/voided"},
        "object": {"objectType": "StatementRef", "id": target_id}
    });
    let response = router
        .clone()
        .oneshot(xapi_post("/xapi/statements", &voiding))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let voiding_id = body_to_json(response.into_body()).await[0]
        .as_str()
        .unwrap()
        .to_owned();

    // Voiding runs in the background; poll until the target disappears.
    let target_path = format!("/xapi/statements/{target_id}");
    let mut hidden = false;
    for _ in 0..200 {
        let response = router
            .clone()
            .oneshot(xapi_get(&target_path))
            .await
            .unwrap();
        if response.status() == StatusCode::NOT_FOUND {
            hidden = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(hidden, "voided statement was still retrievable");

    // The voiding statement itself stays retrievable.
    let response = router
        .oneshot(xapi_get(&format!("/xapi/statements/{voiding_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// =========================================================================
// Hook management
// =========================================================================

#[tokio::test]
async fn test_hook_crud_lifecycle() {
    let state = make_test_state().await;
    let router = build_router(state);

    let response = router
        .clone()
        .oneshot(xapi_post("/xapi/hooks", &hook_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_to_json(response.into_body()).await;
    let id = created["id"].as_str().unwrap().to_owned();
    assert_eq!(created["config"]["endpoint"], "https://hooks.example.com/sink");

    let response = router
        .clone()
        .oneshot(xapi_get("/xapi/hooks"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_to_json(response.into_body()).await;
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["hooks"][0]["id"], id.as_str());

    let response = router
        .clone()
        .oneshot(xapi_get(&format!("/xapi/hooks/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(xapi_delete(&format!("/xapi/hooks/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .clone()
        .oneshot(xapi_get(&format!("/xapi/hooks/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = router
        .oneshot(xapi_delete(&format!("/xapi/hooks/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_put_hook_creates_then_replaces() {
    let state = make_test_state().await;
    let router = build_router(state);

    let id = Uuid::new_v4();
    let path = format!("/xapi/hooks/{id}");

    let response = router
        .clone()
        .oneshot(xapi_put(&path, &hook_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let mut replacement = hook_body();
    replacement["config"] = json!({"endpoint": "https://hooks.example.com/v2"});
    let response = router
        .clone()
        .oneshot(xapi_put(&path, &replacement))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router.oneshot(xapi_get(&path)).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["config"]["endpoint"], "https://hooks.example.com/v2");
}

#[tokio::test]
async fn test_hook_registration_requires_an_endpoint() {
    let state = make_test_state().await;
    let router = build_router(state);

    let response = router
        .clone()
        .oneshot(xapi_post("/xapi/hooks", &json!({"config": {}})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = router
        .oneshot(xapi_post("/xapi/hooks", &json!({"filters": {}})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =========================================================================
// Webhook fan-out
// =========================================================================

type Delivery = (Option<String>, String);

async fn record_delivery(
    State(tx): State<mpsc::UnboundedSender<Delivery>>,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    let signature = headers
        .get("x-lrs-signature")
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned);
    let _ = tx.send((signature, body));
    StatusCode::OK
}

/// Bind a loopback endpoint recording every webhook POST it receives.
async fn spawn_receiver() -> (SocketAddr, mpsc::UnboundedReceiver<Delivery>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = Router::new()
        .route("/events", post(record_delivery))
        .with_state(tx);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, rx)
}

#[tokio::test]
async fn test_registered_hook_receives_matching_statements() {
    let (addr, mut inbox) = spawn_receiver().await;
    let state = make_test_state().await;
    let router = build_router(state);

    let hook = json!({
        "filters": {"verb": [{"id": "http://adlnet.gov/expapi/verbs/completed"}]},
        "config": {"endpoint": format!("http://{addr}/events")}
    });
    let response = router
        .clone()
        .oneshot(xapi_post("/xapi/hooks", &hook))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .oneshot(xapi_post("/xapi/statements", &valid_statement()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let ids = body_to_json(response.into_body()).await;
    let id = ids[0].as_str().unwrap().to_owned();

    // Dispatch runs in the background; wait for the delivery to land.
    let (signature, body) = tokio::time::timeout(Duration::from_secs(5), inbox.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(signature, None);
    let payload: Value = serde_json::from_str(&body).unwrap();
    assert!(payload["id"].is_string());
    assert_eq!(payload["statements"][0]["id"], id.as_str());
    assert_eq!(
        payload["statements"][0]["verb"]["id"],
        "http://adlnet.gov/expapi/verbs/completed"
    );
}

// =========================================================================
// Discovery
// =========================================================================

#[tokio::test]
async fn test_about_reports_version_and_features() {
    let state = make_test_state().await;
    let router = build_router(state);

    // No version header: /about must work so clients can discover one.
    let response = router
        .oneshot(Request::get("/about").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["version"][0], "1.0.3");
    assert_eq!(json["features"]["statement_hooks"], true);
}
