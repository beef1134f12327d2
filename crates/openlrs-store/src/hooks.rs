//! Hook store: registered delivery subscriptions.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use openlrs_types::{Hook, HookId};

/// Store of registered hooks.
#[derive(Debug, Clone, Default)]
pub struct HookStore {
    inner: Arc<RwLock<BTreeMap<HookId, Hook>>>,
}

impl HookStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a hook. Returns `true` when the id was new.
    pub async fn put(&self, hook: Hook) -> bool {
        self.inner.write().await.insert(hook.id, hook).is_none()
    }

    /// Fetch a hook by id.
    pub async fn get(&self, id: HookId) -> Option<Hook> {
        self.inner.read().await.get(&id).cloned()
    }

    /// Remove a hook. Returns `true` when it existed.
    pub async fn delete(&self, id: HookId) -> bool {
        self.inner.write().await.remove(&id).is_some()
    }

    /// Snapshot of every registered hook.
    ///
    /// Dispatch iterates over this copy, so hooks added or removed while a
    /// delivery round runs take effect on the next round.
    pub async fn list(&self) -> Vec<Hook> {
        self.inner.read().await.values().cloned().collect()
    }

    /// Number of registered hooks.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether no hooks are registered.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
