//! Service initialization and application state setup

use crate::auth::{AuthFailureLimiter, AuthState, JwtService};
use crate::constants::{AUTH_FAILURE_WINDOW_SECS, AUTH_MAX_FAILURES};
use crate::services::{
    AccessPolicyEngine, DocumentResolver, EmailService, Mailer, ReleaseService,
};
use crate::state::{AppState, DbState, DocumentsConfig, ServicesState};
use anyhow::Result;
use parcelvault_core::Config;
use parcelvault_db::{
    AccessCodeRepository, AccessRequestRepository, DownloadLogRepository, ParcelRepository, Store,
};
use parcelvault_processing::{PdfValidator, WatermarkConfig, Watermarker};
use parcelvault_storage::Storage;
use std::sync::Arc;

/// Initialize all services and repositories, returning the application state
pub fn initialize_services(
    config: &Config,
    store: Arc<Store>,
    storage: Arc<dyn Storage>,
) -> Result<Arc<AppState>> {
    let mailer = match EmailService::from_config(config) {
        Some(service) => {
            tracing::info!(
                host = config.smtp_host().unwrap_or_default(),
                "Email delivery enabled"
            );
            Some(Arc::new(service) as Arc<dyn Mailer>)
        }
        None => {
            tracing::info!("Email delivery disabled");
            None
        }
    };

    Ok(build_state(config, store, storage, mailer))
}

/// Wire repositories and services over an already opened store and storage.
pub fn build_state(
    config: &Config,
    store: Arc<Store>,
    storage: Arc<dyn Storage>,
    mailer: Option<Arc<dyn Mailer>>,
) -> Arc<AppState> {
    let db = DbState {
        access_codes: AccessCodeRepository::new(store.clone()),
        parcels: ParcelRepository::new(store.clone()),
        download_logs: DownloadLogRepository::new(store.clone()),
        access_requests: AccessRequestRepository::new(store),
    };

    let documents = DocumentsConfig {
        storage: storage.clone(),
        validator: PdfValidator::new(config.max_document_size_bytes()),
        max_file_size: config.max_document_size_bytes(),
    };

    let policy = AccessPolicyEngine::new(db.access_codes.clone(), db.parcels.clone());
    let resolver = DocumentResolver::new(db.parcels.clone(), storage);
    let watermarker = Watermarker::new(WatermarkConfig {
        opacity: config.watermark_opacity(),
    });
    let release = ReleaseService::new(
        resolver.clone(),
        db.download_logs.clone(),
        watermarker,
        config.release_workers(),
    );
    tracing::info!(
        release_workers = config.release_workers(),
        watermark_opacity = config.watermark_opacity(),
        "Release pipeline initialized"
    );

    let services = ServicesState {
        policy,
        resolver,
        release,
        mailer,
        default_code_ttl_hours: config.default_code_ttl_hours(),
    };

    let auth = Arc::new(AuthState {
        jwt: JwtService::new(config.jwt_secret(), config.jwt_expiry_hours()),
        admin_username: config.admin_username().to_string(),
        admin_password: config.admin_password().to_string(),
        auth_failure_limiter: Some(Arc::new(AuthFailureLimiter::new(
            AUTH_MAX_FAILURES,
            AUTH_FAILURE_WINDOW_SECS,
        ))),
    });

    Arc::new(AppState {
        db,
        documents,
        services,
        auth,
        is_production: config.is_production(),
        config: config.clone(),
    })
}
