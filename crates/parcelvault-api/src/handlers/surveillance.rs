use crate::error::{ErrorResponse, FormOrJson, HttpAppError};
use crate::handlers::verification::CodeParcelRequest;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use parcelvault_core::policy::DenialReason;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct SurveillanceAccessResponse {
    pub access_granted: bool,
    pub client_name: String,
    pub parcelle_id: String,
    pub video_url: String,
}

#[utoipa::path(
    post,
    path = "/api/surveillance/access",
    tag = "access",
    request_body = CodeParcelRequest,
    responses(
        (status = 200, description = "Live feed URL for the parcel", body = SurveillanceAccessResponse),
        (status = 403, description = "Code does not grant surveillance on this parcel", body = ErrorResponse)
    )
)]
pub async fn surveillance_access(
    State(state): State<Arc<AppState>>,
    FormOrJson(request): FormOrJson<CodeParcelRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let code = request.code.trim();
    let parcel_id = request.parcelle_id.trim();
    let decision = state.services.policy.evaluate(code, parcel_id).await?;

    let video_url = match decision.video_url {
        Some(url) if decision.can_access_surveillance => url,
        _ => {
            tracing::warn!(
                parcel_id = %parcel_id,
                profile_type = %decision.profile_type,
                "Surveillance requested without an active feed"
            );
            return Err(DenialReason::OutOfScope
                .into_error(code, Some(parcel_id))
                .into());
        }
    };

    Ok(Json(SurveillanceAccessResponse {
        access_granted: true,
        client_name: decision.client_name,
        parcelle_id: decision.parcel_id,
        video_url,
    }))
}
