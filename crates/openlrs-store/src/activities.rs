//! Activity store: canonical activity definitions keyed by IRI.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use openlrs_types::{Activity, ActivityDefinition};

/// Store of canonical activities.
#[derive(Debug, Clone, Default)]
pub struct ActivityStore {
    inner: Arc<RwLock<BTreeMap<String, Activity>>>,
}

impl ActivityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an activity seen during ingest, creating it if unknown.
    ///
    /// An inline definition carried by the statement is merged into the
    /// canonical one: language maps grow key by key, scalar fields are
    /// taken from the incoming definition wholesale.
    pub async fn upsert(&self, id: &str, definition: Option<&ActivityDefinition>) {
        let mut map = self.inner.write().await;
        match map.get_mut(id) {
            Some(existing) => {
                if let Some(incoming) = definition {
                    existing.definition.merge_from(incoming);
                }
            }
            None => {
                map.insert(
                    id.to_owned(),
                    Activity {
                        id: id.to_owned(),
                        definition: definition.cloned().unwrap_or_default(),
                    },
                );
            }
        }
    }

    /// Merge a fetched definition into an already-known activity.
    ///
    /// Returns `false` when the activity has never been seen; metadata
    /// resolution never creates rows on its own.
    pub async fn merge_definition(&self, id: &str, incoming: &ActivityDefinition) -> bool {
        let mut map = self.inner.write().await;
        match map.get_mut(id) {
            Some(existing) => {
                existing.definition.merge_from(incoming);
                true
            }
            None => false,
        }
    }

    /// Fetch an activity by IRI.
    pub async fn get(&self, id: &str) -> Option<Activity> {
        self.inner.read().await.get(id).cloned()
    }

    /// Number of known activities.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether the store holds no activities.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
