//! Domain route groups (catalog, code holders, admin).

use crate::constants::API_PREFIX;
use crate::handlers;
use crate::state::AppState;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use std::sync::Arc;

fn api(path: &str) -> String {
    format!("{}{}", API_PREFIX, path)
}

pub fn catalog_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(&api("/parcelles"), get(handlers::parcels::list_parcelles))
        .route(&api("/parcelles/{id}"), get(handlers::parcels::get_parcelle))
        .route(
            &api("/parcelles/{id}/documents"),
            get(handlers::parcels::parcel_documents),
        )
        .route(&api("/stats"), get(handlers::parcels::catalog_stats))
        .with_state(state)
}

/// Everything a code holder can reach. The code itself is the credential.
pub fn code_holder_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &api("/documents/verify-code"),
            post(handlers::verification::verify_code),
        )
        .route(
            &api("/documents/verify-profile"),
            post(handlers::verification::verify_profile),
        )
        .route(
            &api("/documents/get-owner-parcelles"),
            post(handlers::verification::get_owner_parcelles),
        )
        .route(&api("/documents/send"), post(handlers::delivery::send_document))
        .route(
            &api("/documents/send-email"),
            post(handlers::delivery::send_email),
        )
        .route(
            &api("/documents/{parcelle_id}/{document_type}"),
            get(handlers::documents::get_document),
        )
        .route(
            &api("/surveillance/access"),
            post(handlers::surveillance::surveillance_access),
        )
        .route(
            &api("/code-requests"),
            post(handlers::code_requests::create_code_request),
        )
        .route(&api("/auth/login"), post(handlers::auth::login))
        .with_state(state)
}

pub fn admin_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(&api("/auth/verify"), get(handlers::auth::verify))
        .route(
            &api("/admin/access-codes"),
            post(handlers::access_codes::create_access_code)
                .get(handlers::access_codes::list_access_codes),
        )
        .route(
            &api("/admin/access-codes/{id}"),
            delete(handlers::access_codes::revoke_access_code),
        )
        .route(
            &api("/admin/download-logs"),
            get(handlers::audit::download_logs),
        )
        .route(
            &api("/admin/download-logs/stats"),
            get(handlers::audit::download_stats),
        )
        .route(
            &api("/admin/notifications"),
            get(handlers::audit::notifications),
        )
        .route(
            &api("/admin/access-logs/realtime"),
            get(handlers::audit::realtime_access_logs),
        )
        .route(
            &api("/admin/code-requests"),
            get(handlers::code_requests::list_code_requests),
        )
        .route(
            &api("/admin/parcelles/import"),
            post(handlers::parcels::import_parcelles),
        )
        .route(
            &api("/admin/parcelles/{id}/status"),
            patch(handlers::parcels::update_parcel_status),
        )
        .route(
            &api("/admin/upload/document/{parcelle_id}"),
            post(handlers::admin_documents::upload_document),
        )
        .route(
            &api("/admin/document/{parcelle_id}/{document_type}"),
            delete(handlers::admin_documents::delete_document),
        )
        .with_state(state)
}
