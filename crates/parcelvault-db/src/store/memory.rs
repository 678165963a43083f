use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DataStore, Snapshot, StoreError, StoreResult};

/// Process-local backend. Used by tests and `STORE_BACKEND=memory`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    snapshot: RwLock<Snapshot>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a seeded snapshot (fixture parcels, pre-issued codes).
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
        }
    }
}

#[async_trait]
impl DataStore for InMemoryStore {
    async fn load(&self) -> StoreResult<Snapshot> {
        Ok(self.snapshot.read().await.clone())
    }

    async fn persist(&self, expected_revision: u64, snapshot: &Snapshot) -> StoreResult<()> {
        let mut current = self.snapshot.write().await;
        if current.revision != expected_revision {
            return Err(StoreError::Conflict {
                expected: expected_revision,
                found: current.revision,
            });
        }
        *current = snapshot.clone();
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
