use crate::auth::models::AdminContext;
use crate::constants::MAX_CODE_TTL_HOURS;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Duration, Utc};
use parcelvault_core::models::{AccessCode, AccessGrant, ParcelConfig, ProfileType};
use parcelvault_core::AppError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAccessCodeRequest {
    #[validate(length(min = 1, max = 200, message = "client_name is required"))]
    pub client_name: String,
    #[validate(email(message = "client_email must be a valid email address"))]
    pub client_email: String,
    #[serde(default)]
    pub profile_type: ProfileType,
    /// Empty grants every parcel in the catalog.
    #[serde(default)]
    pub parcelle_ids: Vec<String>,
    /// Defaults to `DEFAULT_CODE_TTL_HOURS`.
    pub expires_hours: Option<i64>,
    #[serde(default)]
    pub camera_enabled: bool,
    #[validate(url(message = "video_url must be a valid URL"))]
    pub video_url: Option<String>,
    #[serde(default)]
    pub parcelle_configs: BTreeMap<String, ParcelConfig>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateAccessCodeResponse {
    pub id: Uuid,
    pub code: String,
    pub client_name: String,
    pub profile_type: ProfileType,
    pub parcelle_ids: Vec<String>,
    pub parcelle_count: usize,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessCodeView {
    #[serde(flatten)]
    pub access_code: AccessCode,
    pub is_expired: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessCodeListResponse {
    pub access_codes: Vec<AccessCodeView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RevokeResponse {
    pub message: String,
    pub id: Uuid,
}

#[utoipa::path(
    post,
    path = "/api/admin/access-codes",
    tag = "admin",
    request_body = CreateAccessCodeRequest,
    responses(
        (status = 201, description = "Access code issued", body = CreateAccessCodeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_access_code(
    State(state): State<Arc<AppState>>,
    admin: AdminContext,
    ValidatedJson(request): ValidatedJson<CreateAccessCodeRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;

    let expires_hours = request
        .expires_hours
        .unwrap_or(state.services.default_code_ttl_hours);
    if !(1..=MAX_CODE_TTL_HOURS).contains(&expires_hours) {
        return Err(AppError::InvalidInput(format!(
            "expires_hours must be between 1 and {}",
            MAX_CODE_TTL_HOURS
        ))
        .into());
    }

    let grant = AccessGrant {
        client_name: request.client_name.trim().to_string(),
        client_email: request.client_email.trim().to_string(),
        profile_type: request.profile_type,
        parcelle_ids: request.parcelle_ids,
        parcelle_configs: request.parcelle_configs,
        camera_enabled: request.camera_enabled,
        video_url: request.video_url,
        expires_at: Utc::now() + Duration::hours(expires_hours),
    };

    let created = state.db.access_codes.create(grant).await?;
    tracing::info!(
        admin = %admin.username,
        access_code_id = %created.id,
        profile_type = %created.profile_type,
        parcel_count = created.parcelle_ids.len(),
        "Access code created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateAccessCodeResponse {
            id: created.id,
            parcelle_count: created.parcelle_ids.len(),
            code: created.code,
            client_name: created.client_name,
            profile_type: created.profile_type,
            parcelle_ids: created.parcelle_ids,
            expires_at: created.expires_at,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/access-codes",
    tag = "admin",
    responses(
        (status = 200, description = "Every issued code, revoked ones included", body = AccessCodeListResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_access_codes(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
) -> Result<impl IntoResponse, HttpAppError> {
    let now = Utc::now();
    let access_codes = state
        .db
        .access_codes
        .list()
        .await?
        .into_iter()
        .map(|access_code| AccessCodeView {
            is_expired: access_code.is_expired_at(now),
            access_code,
        })
        .collect();
    Ok(Json(AccessCodeListResponse { access_codes }))
}

#[utoipa::path(
    delete,
    path = "/api/admin/access-codes/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Access code ID")),
    responses(
        (status = 200, description = "Code revoked", body = RevokeResponse),
        (status = 404, description = "Access code not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn revoke_access_code(
    State(state): State<Arc<AppState>>,
    admin: AdminContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let revoked = state.db.access_codes.revoke(id).await?;
    tracing::info!(admin = %admin.username, access_code_id = %revoked.id, "Access code revoked");
    Ok(Json(RevokeResponse {
        message: "Access code revoked".to_string(),
        id: revoked.id,
    }))
}
