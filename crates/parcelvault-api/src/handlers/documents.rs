use crate::constants::DOCUMENT_SOURCE_HEADER;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::{ReleaseAction, ReleasedDocument};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct DocumentQuery {
    /// Access code
    pub code: String,
    /// preview | download | info
    #[serde(default)]
    pub action: ReleaseAction,
}

fn pdf_response(document: ReleasedDocument, action: ReleaseAction) -> Response {
    let disposition = match action {
        ReleaseAction::Preview => "inline",
        _ => "attachment",
    };
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("{}; filename=\"{}\"", disposition, document.filename),
            ),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        [(DOCUMENT_SOURCE_HEADER, document.source.as_str())],
        Bytes::from(document.bytes),
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/api/documents/{parcelle_id}/{document_type}",
    tag = "documents",
    params(
        ("parcelle_id" = String, Path, description = "Parcel ID"),
        ("document_type" = String, Path, description = "acd, plan, titre_foncier, ..."),
        DocumentQuery
    ),
    responses(
        (status = 200, description = "PDF stream, or DocumentInfo JSON when action=info"),
        (status = 403, description = "Invalid, expired or unauthorized access code", body = ErrorResponse),
        (status = 404, description = "Parcel or document not found", body = ErrorResponse)
    )
)]
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path((parcelle_id, document_type)): Path<(String, String)>,
    Query(query): Query<DocumentQuery>,
) -> Result<Response, HttpAppError> {
    let services = &state.services;
    let decision = services
        .policy
        .evaluate(query.code.trim(), &parcelle_id)
        .await?;

    match query.action {
        ReleaseAction::Info => {
            let info = services.release.describe(&decision, &document_type).await?;
            Ok(Json(info).into_response())
        }
        action => {
            let document = services
                .release
                .release_and_record(&decision, &document_type)
                .await?;
            tracing::info!(
                parcel_id = %parcelle_id,
                document_type = %document_type,
                source = document.source.as_str(),
                watermarked = document.watermarked,
                bytes = document.bytes.len(),
                "Document released"
            );
            Ok(pdf_response(document, action))
        }
    }
}
