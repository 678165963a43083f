//! Code-holder endpoints. Browsers post these as forms, API clients as JSON.

use crate::error::{ErrorResponse, FormOrJson, HttpAppError};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use parcelvault_core::models::{Parcel, ProfileType};
use parcelvault_core::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyCodeRequest {
    pub code: String,
    #[serde(default)]
    pub parcelle_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CodeParcelRequest {
    pub code: String,
    pub parcelle_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CodeRequest {
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyCodeResponse {
    pub valid: bool,
    pub client_name: String,
    pub profile_type: ProfileType,
    pub expires_at: DateTime<Utc>,
    pub parcelle_ids: Vec<String>,
    pub is_all_parcelles: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyProfileResponse {
    pub valid: bool,
    pub client_name: String,
    pub profile_type: ProfileType,
    pub is_expired: bool,
    pub expires_at: DateTime<Utc>,
    pub show_watermark: bool,
    pub can_access_surveillance: bool,
    pub camera_enabled: bool,
    pub parcelle_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OwnerParcellesResponse {
    pub client_name: String,
    pub profile_type: ProfileType,
    pub is_multi_parcelle: bool,
    pub parcelle_count: usize,
    #[schema(value_type = Vec<Object>)]
    pub parcelles: Vec<Parcel>,
}

#[utoipa::path(
    post,
    path = "/api/documents/verify-code",
    tag = "access",
    request_body = VerifyCodeRequest,
    responses(
        (status = 200, description = "Code is valid", body = VerifyCodeResponse),
        (status = 403, description = "Invalid, expired or unauthorized access code", body = ErrorResponse)
    )
)]
pub async fn verify_code(
    State(state): State<Arc<AppState>>,
    FormOrJson(request): FormOrJson<VerifyCodeRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let parcelle_id = request
        .parcelle_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());
    let record = state
        .services
        .policy
        .verify_code(request.code.trim(), parcelle_id)
        .await?;

    Ok(Json(VerifyCodeResponse {
        valid: true,
        is_all_parcelles: record.is_wildcard_scope(),
        client_name: record.client_name,
        profile_type: record.profile_type,
        expires_at: record.expires_at,
        parcelle_ids: record.parcelle_ids,
    }))
}

#[utoipa::path(
    post,
    path = "/api/documents/verify-profile",
    tag = "access",
    request_body = CodeParcelRequest,
    responses(
        (status = 200, description = "What the code may do on this parcel", body = VerifyProfileResponse),
        (status = 403, description = "Invalid, expired or unauthorized access code", body = ErrorResponse),
        (status = 404, description = "Parcel not found", body = ErrorResponse)
    )
)]
pub async fn verify_profile(
    State(state): State<Arc<AppState>>,
    FormOrJson(request): FormOrJson<CodeParcelRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let decision = state
        .services
        .policy
        .evaluate(request.code.trim(), request.parcelle_id.trim())
        .await?;
    // A wildcard code passes scope for any id, catalog or not.
    if state.db.parcels.get(&decision.parcel_id).await?.is_none() {
        return Err(AppError::ParcelNotFound(decision.parcel_id).into());
    }

    Ok(Json(VerifyProfileResponse {
        valid: true,
        client_name: decision.client_name,
        profile_type: decision.profile_type,
        is_expired: false,
        expires_at: decision.expires_at,
        show_watermark: decision.show_watermark,
        can_access_surveillance: decision.can_access_surveillance,
        camera_enabled: decision.camera_enabled,
        parcelle_id: decision.parcel_id,
    }))
}

#[utoipa::path(
    post,
    path = "/api/documents/get-owner-parcelles",
    tag = "access",
    request_body = CodeRequest,
    responses(
        (status = 200, description = "Every parcel the code covers", body = OwnerParcellesResponse),
        (status = 403, description = "Invalid, expired or unauthorized access code", body = ErrorResponse)
    )
)]
pub async fn get_owner_parcelles(
    State(state): State<Arc<AppState>>,
    FormOrJson(request): FormOrJson<CodeRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let owner = state
        .services
        .policy
        .resolve_owner_parcelles(request.code.trim())
        .await?;

    Ok(Json(OwnerParcellesResponse {
        is_multi_parcelle: owner.is_multi(),
        parcelle_count: owner.parcel_count(),
        client_name: owner.client_name,
        profile_type: owner.profile_type,
        parcelles: owner.parcels,
    }))
}
