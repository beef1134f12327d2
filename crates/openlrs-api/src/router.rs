//! Axum router construction for the LRS API.
//!
//! Assembles the xAPI resource routes and the discovery endpoint into a
//! single [`Router`] with version negotiation and CORS middleware.

use std::sync::Arc;

use axum::routing::get;
use axum::{Router, middleware};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::version;

/// Build the complete Axum router for the LRS server.
///
/// The router includes:
/// - `POST /xapi/statements` -- store one statement or a batch
/// - `GET /xapi/statements/{id}` -- fetch a stored statement verbatim
/// - `GET|POST /xapi/hooks` -- list or register hooks
/// - `GET|PUT|DELETE /xapi/hooks/{id}` -- manage a single hook
/// - `GET /about` -- version and feature discovery
///
/// Everything under `/xapi` requires an `X-Experience-API-Version`
/// header from the 1.0 family; `/about` is exempt so clients can
/// discover what to send. Every response is stamped with the version
/// the server speaks.
///
/// CORS is configured to allow any origin for development. In
/// production this should be restricted.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let xapi = Router::new()
        .route("/statements", axum::routing::post(handlers::store_statements))
        .route("/statements/{id}", get(handlers::get_statement))
        .route(
            "/hooks",
            get(handlers::list_hooks).post(handlers::create_hook),
        )
        .route(
            "/hooks/{id}",
            get(handlers::get_hook)
                .put(handlers::put_hook)
                .delete(handlers::delete_hook),
        )
        .route_layer(middleware::from_fn(version::require_version));

    Router::new()
        .route("/about", get(handlers::about))
        .nest("/xapi", xapi)
        .layer(middleware::from_fn(version::stamp_version))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
