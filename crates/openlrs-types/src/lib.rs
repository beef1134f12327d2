//! Shared xAPI data model for the openlrs workspace.
//!
//! This crate is the single source of truth for the records the rest of the
//! workspace passes around: statements as stored, actors and their
//! inverse-functional identifiers, activities with their merged definitions,
//! and webhook registrations. It holds data and the small amount of
//! behavior that belongs to the data (extraction from validated documents,
//! definition merging, related-position lookups) and nothing else.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for statement and hook identifiers
//! - [`agent`] -- Actors and inverse-functional identifiers
//! - [`activity`] -- Activities, definitions, and the definition merge rule
//! - [`statement`] -- Stored statement records and related-position accessors
//! - [`hook`] -- Webhook registrations and delivery configuration

pub mod activity;
pub mod agent;
pub mod hook;
pub mod ids;
pub mod statement;

// Re-export all public types at crate root for convenience.
pub use activity::{Activity, ActivityDefinition, InteractionComponent, InteractionType};
pub use agent::{Agent, AgentKind, Ifi};
pub use hook::{Hook, HookConfig, HookContentType};
pub use ids::{HookId, StatementId};
pub use statement::{
    StatementContext, StatementObject, StoredStatement, SubObject, SubStatement, VOIDED_VERB,
    identified_actors,
};
