use crate::auth::models::{LoginRequest, LoginResponse, VerifyResponse};
use crate::error;
use crate::handlers;
use crate::services::{DocumentInfo, ReleaseAction, SourceKind};
use parcelvault_core::models;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Returns the OpenAPI document served at `/api/openapi.json`.
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ParcelVault API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Access-code portal for land parcel documents. Code holders verify their code and \
            retrieve official PDFs (watermarked for prospects); administrators issue codes, upload documents \
            and follow the download audit trail."
    ),
    paths(
        // Catalog
        handlers::parcels::list_parcelles,
        handlers::parcels::get_parcelle,
        handlers::parcels::parcel_documents,
        handlers::parcels::catalog_stats,
        // Code holders
        handlers::verification::verify_code,
        handlers::verification::verify_profile,
        handlers::verification::get_owner_parcelles,
        handlers::documents::get_document,
        handlers::delivery::send_document,
        handlers::delivery::send_email,
        handlers::surveillance::surveillance_access,
        handlers::code_requests::create_code_request,
        // Auth
        handlers::auth::login,
        handlers::auth::verify,
        // Admin
        handlers::access_codes::create_access_code,
        handlers::access_codes::list_access_codes,
        handlers::access_codes::revoke_access_code,
        handlers::audit::download_logs,
        handlers::audit::download_stats,
        handlers::audit::notifications,
        handlers::audit::realtime_access_logs,
        handlers::code_requests::list_code_requests,
        handlers::parcels::import_parcelles,
        handlers::parcels::update_parcel_status,
        handlers::admin_documents::upload_document,
        handlers::admin_documents::delete_document,
    ),
    components(
        schemas(
            // Core models
            models::ProfileType,
            models::ParcelConfig,
            models::AccessCode,
            models::DocumentFile,
            models::DownloadLogEntry,
            models::DownloadStats,
            models::ActivityNotifications,
            models::AccessRequest,
            models::AccessRequestStatus,
            // Catalog
            handlers::parcels::ParcelListResponse,
            handlers::parcels::AvailableDocument,
            handlers::parcels::ParcelDocumentsResponse,
            handlers::parcels::ImportResponse,
            handlers::parcels::StatusUpdateRequest,
            // Verification
            handlers::verification::VerifyCodeRequest,
            handlers::verification::CodeParcelRequest,
            handlers::verification::CodeRequest,
            handlers::verification::VerifyCodeResponse,
            handlers::verification::VerifyProfileResponse,
            handlers::verification::OwnerParcellesResponse,
            // Release and delivery
            DocumentInfo,
            SourceKind,
            ReleaseAction,
            handlers::delivery::DeliveryMethod,
            handlers::delivery::SendDocumentRequest,
            handlers::delivery::SendEmailRequest,
            handlers::delivery::SendDocumentResponse,
            handlers::surveillance::SurveillanceAccessResponse,
            // Access codes
            handlers::access_codes::CreateAccessCodeRequest,
            handlers::access_codes::CreateAccessCodeResponse,
            handlers::access_codes::AccessCodeView,
            handlers::access_codes::AccessCodeListResponse,
            handlers::access_codes::RevokeResponse,
            // Requests and audit
            handlers::code_requests::CreateCodeRequest,
            handlers::code_requests::CodeRequestCreated,
            handlers::code_requests::CodeRequestListResponse,
            handlers::audit::DownloadLogsResponse,
            handlers::admin_documents::UploadDocumentResponse,
            handlers::admin_documents::DeleteDocumentResponse,
            // Auth
            LoginRequest,
            LoginResponse,
            VerifyResponse,
            // Error
            error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "parcelles", description = "Public parcel catalog"),
        (name = "access", description = "Code verification, surveillance access and code requests"),
        (name = "documents", description = "Document release and delivery"),
        (name = "auth", description = "Administrator login"),
        (name = "admin", description = "Access codes, official documents and the request queue"),
        (name = "audit", description = "Download trail and activity feed")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_release_route_and_bearer_scheme() {
        let spec = get_openapi_spec();
        assert!(spec
            .paths
            .paths
            .contains_key("/api/documents/{parcelle_id}/{document_type}"));
        let components = spec.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("AccessCode"));
    }
}
