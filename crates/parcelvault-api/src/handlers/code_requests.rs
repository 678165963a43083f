use crate::auth::models::AdminContext;
use crate::error::{ErrorResponse, FormOrJson, HttpAppError};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use parcelvault_core::models::{AccessRequest, AccessRequestStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCodeRequest {
    #[validate(length(min = 1, max = 100))]
    pub nom: String,
    #[validate(length(min = 1, max = 100))]
    pub prenom: String,
    #[validate(length(min = 6, max = 32))]
    pub whatsapp: String,
    #[validate(length(min = 1))]
    pub parcelle_id: String,
    #[serde(default)]
    pub parcelle_nom: Option<String>,
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CodeRequestCreated {
    pub success: bool,
    pub request: AccessRequest,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CodeRequestListResponse {
    pub requests: Vec<AccessRequest>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[utoipa::path(
    post,
    path = "/api/code-requests",
    tag = "access",
    request_body = CreateCodeRequest,
    responses(
        (status = 201, description = "Request queued for an administrator", body = CodeRequestCreated),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
pub async fn create_code_request(
    State(state): State<Arc<AppState>>,
    FormOrJson(request): FormOrJson<CreateCodeRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;

    let created = state
        .db
        .access_requests
        .create(AccessRequest {
            id: Uuid::new_v4(),
            parcelle_id: request.parcelle_id.trim().to_string(),
            parcelle_nom: non_blank(request.parcelle_nom),
            client_name: format!("{} {}", request.prenom.trim(), request.nom.trim()),
            client_email: non_blank(request.email),
            whatsapp: Some(request.whatsapp.trim().to_string()),
            status: AccessRequestStatus::Pending,
            created_at: Utc::now(),
        })
        .await?;
    tracing::info!(request_id = %created.id, parcel_id = %created.parcelle_id, "Access code requested");

    Ok((
        StatusCode::CREATED,
        Json(CodeRequestCreated {
            success: true,
            request: created,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/code-requests",
    tag = "admin",
    responses(
        (status = 200, description = "Pending and processed requests, newest first", body = CodeRequestListResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_code_requests(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
) -> Result<impl IntoResponse, HttpAppError> {
    let requests = state.db.access_requests.list().await?;
    Ok(Json(CodeRequestListResponse { requests }))
}
