use crate::auth::middleware::client_ip;
use crate::auth::models::{AdminContext, LoginRequest, LoginResponse, VerifyResponse};
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use parcelvault_core::AppError;
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 429, description = "Too many failed attempts")
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Response, HttpAppError> {
    let ip = client_ip(&headers);
    let limiter = state.auth.auth_failure_limiter.as_ref();

    if let Some(limiter) = limiter {
        if limiter.is_blocked(&ip).await {
            return Ok((StatusCode::TOO_MANY_REQUESTS, "Too many failed login attempts").into_response());
        }
    }

    if !state
        .auth
        .credentials_match(request.username.trim(), &request.password)
    {
        if let Some(limiter) = limiter {
            limiter.record_failure(&ip).await;
        }
        tracing::warn!(client_ip = %ip, "Admin login rejected");
        return Err(AppError::Unauthorized("Invalid credentials".to_string()).into());
    }

    let token = state.auth.jwt.issue(&state.auth.admin_username)?;
    tracing::info!(client_ip = %ip, "Admin logged in");

    Ok(Json(LoginResponse {
        token,
        username: state.auth.admin_username.clone(),
    })
    .into_response())
}

#[utoipa::path(
    get,
    path = "/api/auth/verify",
    tag = "auth",
    responses(
        (status = 200, description = "Token is valid", body = VerifyResponse),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn verify(admin: AdminContext) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        valid: true,
        username: admin.username,
    })
}
