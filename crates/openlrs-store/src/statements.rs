//! Statement store: append-only records with a monotonic voided flag.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tokio::sync::RwLock;

use openlrs_types::{StatementId, StoredStatement};

use crate::error::StoreError;

/// Store of accepted statements, keyed by statement id.
///
/// Records are shared out as [`Arc`]s so the matcher can hold a batch
/// without cloning documents. Statements are never deleted; voiding only
/// flips the flag.
#[derive(Debug, Clone, Default)]
pub struct StatementStore {
    inner: Arc<RwLock<BTreeMap<StatementId, Arc<StoredStatement>>>>,
}

impl StatementStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a batch of statements, all or nothing.
    ///
    /// The whole batch is checked against the store and against itself
    /// before anything is written, under one write lock: either every
    /// statement lands or none do.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateStatement`] naming the first id that
    /// is already stored or repeated within the batch.
    pub async fn insert_batch(
        &self,
        statements: Vec<StoredStatement>,
    ) -> Result<(), StoreError> {
        let mut map = self.inner.write().await;
        let mut batch_ids = BTreeSet::new();
        for statement in &statements {
            if map.contains_key(&statement.id) || !batch_ids.insert(statement.id) {
                return Err(StoreError::DuplicateStatement(statement.id));
            }
        }
        for statement in statements {
            map.insert(statement.id, Arc::new(statement));
        }
        Ok(())
    }

    /// Fetch one statement, voided or not.
    pub async fn get(&self, id: StatementId) -> Option<Arc<StoredStatement>> {
        self.inner.read().await.get(&id).cloned()
    }

    /// Fetch a batch by id. Unknown ids are skipped, order follows the
    /// input.
    pub async fn get_many(&self, ids: &[StatementId]) -> Vec<Arc<StoredStatement>> {
        let map = self.inner.read().await;
        ids.iter().filter_map(|id| map.get(id).cloned()).collect()
    }

    /// Mark a statement voided. Monotonic: voiding a voided statement is a
    /// no-op. Returns whether the id was known.
    pub async fn void(&self, id: StatementId) -> bool {
        let mut map = self.inner.write().await;
        map.get_mut(&id).is_some_and(|entry| {
            Arc::make_mut(entry).voided = true;
            true
        })
    }

    /// Number of stored statements, voided included.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether the store holds no statements.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
