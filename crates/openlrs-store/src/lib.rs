//! Data layer for the LRS: in-memory stores behind async read/write locks.
//!
//! Every store is a cheap `Clone` handle over shared state, so the API
//! layer and the background job worker hold the same data without any
//! coordination beyond the per-store lock. Statement documents are kept
//! verbatim as received; the typed projection next to each document is
//! what filters match against.
//!
//! # Modules
//!
//! - [`statements`] -- statement documents plus their filterable projection
//! - [`agents`] -- identified actors, looked up by IFI
//! - [`activities`] -- canonical activity definitions, merged over time
//! - [`hooks`] -- registered delivery subscriptions
//! - [`error`] -- shared error types

pub mod activities;
pub mod agents;
pub mod error;
pub mod hooks;
pub mod statements;

// Re-export primary types for convenience.
pub use activities::ActivityStore;
pub use agents::AgentStore;
pub use error::StoreError;
pub use hooks::HookStore;
pub use statements::StatementStore;

/// Handle bundle over all four stores.
///
/// One `Stores` value is created at startup and cloned into the router
/// state and the job worker.
#[derive(Debug, Clone, Default)]
pub struct Stores {
    /// Statement documents and projections.
    pub statements: StatementStore,
    /// Identified actors.
    pub agents: AgentStore,
    /// Canonical activities.
    pub activities: ActivityStore,
    /// Registered hooks.
    pub hooks: HookStore,
}

impl Stores {
    /// Create an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }
}
