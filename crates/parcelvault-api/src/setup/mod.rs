//! Application setup and initialization
//!
//! Startup order: validate configuration, install tracing, open the data store and
//! document storage, build services, mount routes.

pub mod routes;
pub mod server;
pub mod services;
pub mod storage;
pub mod validation;

use crate::state::AppState;
use anyhow::{Context, Result};
use parcelvault_core::Config;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    validation::validate_config(&config).context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.environment())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!("Configuration loaded and validated successfully");

    let store = storage::setup_store(&config).await?;
    let documents = storage::setup_storage(&config).await?;

    let state = services::initialize_services(&config, store, documents)?;

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
