//! Data store and document storage setup

use anyhow::{Context, Result};
use parcelvault_core::Config;
use parcelvault_db::store::open_store;
use parcelvault_db::Store;
use parcelvault_storage::{LocalStorage, Storage};
use std::path::Path;
use std::sync::Arc;

/// Open the configured data store backend and load its snapshot.
pub async fn setup_store(config: &Config) -> Result<Arc<Store>> {
    tracing::info!(backend = ?config.store_backend(), "Opening data store...");
    let store = open_store(config.store_backend(), Path::new(config.data_file())).await?;
    tracing::info!("Data store ready");
    Ok(store)
}

/// Local directory holding uploaded official PDFs.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let storage = LocalStorage::new(config.uploads_path())
        .await
        .with_context(|| format!("Failed to prepare uploads directory {}", config.uploads_path()))?;
    tracing::info!(path = %config.uploads_path(), "Document storage initialized");
    Ok(Arc::new(storage))
}
