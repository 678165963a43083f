//! Snapshot store.
//!
//! Readers get an `Arc<Snapshot>` and never wait on a writer's I/O. Writers are
//! serialized by one async mutex: each mutation clones the current snapshot, applies
//! the change, bumps the revision and asks the backend to persist it only if the
//! stored revision is still the one the change was based on. A stale base (another
//! process wrote the file) is reloaded and the mutation re-applied.

mod factory;
mod json_file;
mod memory;

pub use factory::{create_data_store, open_store};
pub use json_file::JsonFileStore;
pub use memory::InMemoryStore;

use std::sync::Arc;

use async_trait::async_trait;
use parcelvault_core::models::{AccessCode, AccessRequest, DownloadLogEntry, Parcel};
use parcelvault_core::AppError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

const DEFAULT_MAX_WRITE_RETRIES: usize = 3;

/// Store operation errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Revision conflict: expected {expected}, found {found}")]
    Conflict { expected: u64, found: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Task(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { .. } => AppError::StoreWriteConflict(err.to_string()),
            other => AppError::Internal(format!("Data store failure: {}", other)),
        }
    }
}

/// The whole durable state of the portal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Incremented on every persisted write.
    #[serde(default)]
    pub revision: u64,
    #[serde(default, alias = "parcels")]
    pub parcelles: Vec<Parcel>,
    /// Creation order.
    #[serde(default)]
    pub access_codes: Vec<AccessCode>,
    /// Append order.
    #[serde(default)]
    pub download_logs: Vec<DownloadLogEntry>,
    #[serde(default)]
    pub code_requests: Vec<AccessRequest>,
    /// Top-level keys owned by other tools (map settings, etc.), kept as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Persistence backend: get and put of one consistent snapshot.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Read the persisted snapshot. A backend with nothing stored yet returns the default.
    async fn load(&self) -> StoreResult<Snapshot>;

    /// Replace the persisted snapshot, but only if its revision is still `expected_revision`.
    /// Must be all-or-nothing: on error the previous snapshot stays intact.
    async fn persist(&self, expected_revision: u64, snapshot: &Snapshot) -> StoreResult<()>;

    fn backend_name(&self) -> &'static str;
}

/// Cached snapshot plus the single-writer discipline around a [`DataStore`].
pub struct Store {
    backend: Arc<dyn DataStore>,
    current: RwLock<Arc<Snapshot>>,
    writer: Mutex<()>,
    max_retries: usize,
}

impl Store {
    pub async fn open(backend: Arc<dyn DataStore>) -> StoreResult<Self> {
        let snapshot = backend.load().await?;
        tracing::info!(
            backend = backend.backend_name(),
            revision = snapshot.revision,
            parcels = snapshot.parcelles.len(),
            access_codes = snapshot.access_codes.len(),
            "Data store opened"
        );
        Ok(Self {
            backend,
            current: RwLock::new(Arc::new(snapshot)),
            writer: Mutex::new(()),
            max_retries: DEFAULT_MAX_WRITE_RETRIES,
        })
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Latest committed snapshot.
    pub async fn read(&self) -> Arc<Snapshot> {
        self.current.read().await.clone()
    }

    /// Apply `mutate` as one serialized read-modify-write.
    ///
    /// A domain error returned by `mutate` aborts the write with nothing persisted.
    /// `mutate` may run more than once when the backend reports a stale revision,
    /// so it must only touch the snapshot it is given.
    pub async fn write<T, F>(&self, mut mutate: F) -> Result<T, AppError>
    where
        F: FnMut(&mut Snapshot) -> Result<T, AppError>,
    {
        let _guard = self.writer.lock().await;
        let mut base = self.read().await;

        for attempt in 0..=self.max_retries {
            let mut next = Snapshot::clone(&base);
            let value = mutate(&mut next)?;
            next.revision = base.revision + 1;

            match self.backend.persist(base.revision, &next).await {
                Ok(()) => {
                    *self.current.write().await = Arc::new(next);
                    return Ok(value);
                }
                Err(StoreError::Conflict { expected, found }) => {
                    tracing::warn!(
                        attempt,
                        expected,
                        found,
                        "Stale snapshot on write, reloading and retrying"
                    );
                    let fresh = Arc::new(self.backend.load().await?);
                    *self.current.write().await = fresh.clone();
                    base = fresh;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to persist snapshot");
                    return Err(e.into());
                }
            }
        }

        Err(AppError::StoreWriteConflict(format!(
            "gave up after {} retries",
            self.max_retries
        )))
    }
}
