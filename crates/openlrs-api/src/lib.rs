//! HTTP API server for the openlrs Learning Record Store.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Statement resource** (`/xapi/statements`) for storing single
//!   statements or batches and fetching stored documents verbatim
//! - **Hook resource** (`/xapi/hooks`) for registering, replacing,
//!   listing, and removing webhook subscriptions
//! - **Discovery endpoint** (`GET /about`) reporting the xAPI version
//!   and feature flags
//!
//! # Architecture
//!
//! Handlers write to the shared in-memory [`Stores`] and enqueue
//! background jobs through a [`JobSender`]; the response never waits on
//! webhook delivery, metadata resolution, or voiding. Statement ingest
//! is all-or-nothing: every document in a batch is validated before the
//! first one is stored, and an id collision rejects the batch whole.
//!
//! Requests under `/xapi` must carry an `X-Experience-API-Version`
//! header from the 1.0 family; every response is stamped with the
//! version the server speaks.
//!
//! [`Stores`]: openlrs_store::Stores
//! [`JobSender`]: openlrs_tasks::JobSender

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod version;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
pub use version::{VERSION_HEADER, XAPI_VERSION};
