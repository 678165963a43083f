//! Application state and sub-state extractors.
//!
//! AppState is split into domain sub-states so handlers can extract only what they need
//! via Axum's `FromRef`.

use crate::auth::AuthState;
use crate::services::{AccessPolicyEngine, DocumentResolver, Mailer, ReleaseService};
use parcelvault_core::Config;
use parcelvault_db::{
    AccessCodeRepository, AccessRequestRepository, DownloadLogRepository, ParcelRepository,
};
use parcelvault_processing::PdfValidator;
use parcelvault_storage::Storage;
use std::sync::Arc;

// ----- Sub-state types -----

/// Repositories over the shared store.
#[derive(Clone)]
pub struct DbState {
    pub access_codes: AccessCodeRepository,
    pub parcels: ParcelRepository,
    pub download_logs: DownloadLogRepository,
    pub access_requests: AccessRequestRepository,
}

/// Uploaded official documents.
#[derive(Clone)]
pub struct DocumentsConfig {
    pub storage: Arc<dyn Storage>,
    pub validator: PdfValidator,
    pub max_file_size: usize,
}

/// Access decisions, resolution, release and delivery.
#[derive(Clone)]
pub struct ServicesState {
    pub policy: AccessPolicyEngine,
    pub resolver: DocumentResolver,
    pub release: ReleaseService,
    /// `None` when SMTP is not configured.
    pub mailer: Option<Arc<dyn Mailer>>,
    pub default_code_ttl_hours: i64,
}

// ----- AppState -----

/// Main application state: aggregates sub-states for dependency injection.
#[derive(Clone)]
pub struct AppState {
    pub db: DbState,
    pub documents: DocumentsConfig,
    pub services: ServicesState,
    pub auth: Arc<AuthState>,
    pub config: Config,
    pub is_production: bool,
}

// ----- FromRef for sub-state extraction -----

impl axum::extract::FromRef<Arc<AppState>> for DbState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.db.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for DocumentsConfig {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.documents.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for ServicesState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.services.clone()
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
