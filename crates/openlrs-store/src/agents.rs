//! Agent store: identified actors keyed by inverse-functional identifier.

use std::sync::Arc;

use tokio::sync::RwLock;

use openlrs_types::{Agent, Ifi};

use crate::error::StoreError;

/// Store of identified actors.
///
/// Rows are held as a plain list rather than a unique-keyed map so that
/// lookup can honestly report ambiguity: if two rows share an IFI (seeded
/// data, imports), [`AgentStore::lookup`] refuses to pick one.
#[derive(Debug, Clone, Default)]
pub struct AgentStore {
    rows: Arc<RwLock<Vec<Agent>>>,
}

impl AgentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the actor registered under `ifi`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AmbiguousAgent`] when more than one row
    /// matches. Callers must not resolve the tie themselves.
    pub async fn lookup(&self, ifi: &Ifi) -> Result<Option<Agent>, StoreError> {
        let rows = self.rows.read().await;
        let mut matches = rows.iter().filter(|agent| &agent.ifi == ifi);
        match (matches.next(), matches.next()) {
            (Some(first), None) => Ok(Some(first.clone())),
            (Some(_), Some(_)) => Err(StoreError::AmbiguousAgent(ifi.to_string())),
            (None, _) => Ok(None),
        }
    }

    /// Register an actor if its IFI is not yet known (get-or-create).
    ///
    /// Statement ingest runs every identified actor through here, so hook
    /// filters can later resolve the same identifiers.
    pub async fn register(&self, agent: Agent) {
        let mut rows = self.rows.write().await;
        if !rows.iter().any(|existing| existing.ifi == agent.ifi) {
            rows.push(agent);
        }
    }

    /// Insert a row unconditionally, duplicates included.
    ///
    /// Exists for seeding and for exercising the ambiguity path; normal
    /// ingest goes through [`AgentStore::register`].
    pub async fn insert(&self, agent: Agent) {
        self.rows.write().await.push(agent);
    }

    /// Number of rows.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Whether the store holds no rows.
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}
