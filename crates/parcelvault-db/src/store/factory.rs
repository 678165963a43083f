use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use parcelvault_core::StoreBackend;

use super::{DataStore, InMemoryStore, JsonFileStore, Store};

/// Create a data store backend based on configuration
pub fn create_data_store(backend: StoreBackend, data_file: &Path) -> Arc<dyn DataStore> {
    match backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory data store; nothing survives a restart");
            Arc::new(InMemoryStore::new())
        }
        StoreBackend::JsonFile => {
            tracing::info!(path = %data_file.display(), "Using JSON file data store");
            Arc::new(JsonFileStore::new(data_file))
        }
    }
}

/// Build the backend and load its current snapshot.
pub async fn open_store(backend: StoreBackend, data_file: &Path) -> anyhow::Result<Arc<Store>> {
    let store = Store::open(create_data_store(backend, data_file))
        .await
        .with_context(|| format!("Failed to open data store at {}", data_file.display()))?;
    Ok(Arc::new(store))
}
