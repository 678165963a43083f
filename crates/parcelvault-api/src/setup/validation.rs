//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use parcelvault_core::Config;

/// Validate critical configuration values
///
/// Field-level checks live on [`Config::validate`]; this adds the checks that depend
/// on the deployment environment.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let is_production = config.is_production();

    // Validate CORS configuration in production
    if is_production && config.cors_origins().iter().any(|o| o == "*") {
        return Err(anyhow::anyhow!(
            "CORS configured to allow all origins (*) in production. \
            Set specific allowed origins via CORS_ORIGINS."
        ));
    }

    if config.max_document_size_bytes() == 0 {
        return Err(anyhow::anyhow!("Max document size cannot be 0"));
    }

    if config.release_workers() == 0 {
        return Err(anyhow::anyhow!("RELEASE_WORKERS cannot be 0"));
    }

    if config.smtp_host().is_none() {
        tracing::warn!("SMTP_HOST not set - email delivery of documents is disabled");
    }

    if is_production && config.admin_password().len() < 12 {
        tracing::warn!("ADMIN_PASSWORD is shorter than 12 characters");
    }

    tracing::info!("Configuration validation passed");
    Ok(())
}
