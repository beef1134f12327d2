//! Structural and semantic validation of xAPI statement documents.
//!
//! Validation runs before anything is stored: a statement that fails any
//! check is rejected whole, with a [`ValidationError`] naming the position
//! and the problem. The same activity rules guard the metadata resolver, so
//! a bad document fetched from an activity IRI is discarded instead of
//! polluting the activity store.
//!
//! Checks operate on raw [`serde_json::Value`] documents rather than typed
//! structs: the accepted serialization is kept verbatim, so validation must
//! see exactly what was submitted.

mod activity;
mod common;
mod error;
mod statement;

pub use activity::validate_activity;
pub use error::ValidationError;
pub use statement::validate_statement;
