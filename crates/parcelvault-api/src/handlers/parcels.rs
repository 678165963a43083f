use crate::auth::models::AdminContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use parcelvault_core::models::{
    document_label, CatalogStats, Parcel, ParcelStatus, PLACEHOLDER_DOCUMENT_TYPES,
};
use parcelvault_core::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct ParcelListResponse {
    #[schema(value_type = Vec<Object>)]
    pub parcelles: Vec<Parcel>,
}

#[derive(Serialize, ToSchema)]
pub struct AvailableDocument {
    #[serde(rename = "type")]
    pub document_type: String,
    pub label: String,
    /// False when only a specimen can be served.
    pub uploaded: bool,
}

#[derive(Serialize, ToSchema)]
pub struct ParcelDocumentsResponse {
    pub parcelle_id: String,
    pub available_documents: Vec<AvailableDocument>,
}

#[derive(Serialize, ToSchema)]
pub struct ImportResponse {
    pub imported: usize,
    pub total: usize,
}

#[derive(Deserialize, ToSchema)]
pub struct StatusUpdateRequest {
    pub statut: String,
}

#[utoipa::path(
    get,
    path = "/api/parcelles",
    tag = "parcelles",
    responses(
        (status = 200, description = "Parcel catalog", body = ParcelListResponse)
    )
)]
pub async fn list_parcelles(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let parcelles = state.db.parcels.list().await?;
    Ok(Json(ParcelListResponse { parcelles }))
}

#[utoipa::path(
    get,
    path = "/api/parcelles/{id}",
    tag = "parcelles",
    params(("id" = String, Path, description = "Parcel ID")),
    responses(
        (status = 200, description = "Parcel found"),
        (status = 404, description = "Parcel not found", body = ErrorResponse)
    )
)]
pub async fn get_parcelle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let parcel = state
        .db
        .parcels
        .get(&id)
        .await?
        .ok_or(AppError::ParcelNotFound(id))?;
    Ok(Json(parcel))
}

#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "parcelles",
    responses(
        (status = 200, description = "Catalog figures")
    )
)]
pub async fn catalog_stats(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let parcels = state.db.parcels.list().await?;
    Ok(Json(CatalogStats::from_parcels(&parcels)))
}

#[utoipa::path(
    get,
    path = "/api/parcelles/{id}/documents",
    tag = "parcelles",
    params(("id" = String, Path, description = "Parcel ID")),
    responses(
        (status = 200, description = "Document types that can be requested", body = ParcelDocumentsResponse),
        (status = 404, description = "Parcel not found", body = ErrorResponse)
    )
)]
pub async fn parcel_documents(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let parcel = state
        .db
        .parcels
        .get(&id)
        .await?
        .ok_or_else(|| AppError::ParcelNotFound(id.clone()))?;

    let mut available_documents: Vec<AvailableDocument> = parcel
        .official_documents
        .document_types()
        .map(|doc_type| AvailableDocument {
            document_type: doc_type.to_string(),
            label: document_label(doc_type),
            uploaded: true,
        })
        .collect();
    for doc_type in PLACEHOLDER_DOCUMENT_TYPES {
        if !available_documents.iter().any(|d| d.document_type == doc_type) {
            available_documents.push(AvailableDocument {
                document_type: doc_type.to_string(),
                label: document_label(doc_type),
                uploaded: false,
            });
        }
    }

    Ok(Json(ParcelDocumentsResponse {
        parcelle_id: id,
        available_documents,
    }))
}

#[utoipa::path(
    post,
    path = "/api/admin/parcelles/import",
    tag = "admin",
    responses(
        (status = 200, description = "New parcels added, existing ids skipped", body = ImportResponse),
        (status = 400, description = "Invalid parcel payload", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn import_parcelles(
    State(state): State<Arc<AppState>>,
    admin: AdminContext,
    ValidatedJson(parcels): ValidatedJson<Vec<Parcel>>,
) -> Result<impl IntoResponse, HttpAppError> {
    if parcels.iter().any(|p| p.id.trim().is_empty()) {
        return Err(AppError::InvalidInput("Every parcel needs an id".to_string()).into());
    }
    let (imported, total) = state.db.parcels.import(parcels).await?;
    tracing::info!(admin = %admin.username, imported, total, "Parcels imported");
    Ok(Json(ImportResponse { imported, total }))
}

#[utoipa::path(
    patch,
    path = "/api/admin/parcelles/{id}/status",
    tag = "admin",
    params(("id" = String, Path, description = "Parcel ID")),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Updated parcel"),
        (status = 400, description = "Unknown status", body = ErrorResponse),
        (status = 404, description = "Parcel not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_parcel_status(
    State(state): State<Arc<AppState>>,
    admin: AdminContext,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<StatusUpdateRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let status: ParcelStatus = request.statut.parse().map_err(AppError::InvalidInput)?;
    let parcel = state.db.parcels.update_status(&id, status).await?;
    tracing::info!(admin = %admin.username, parcel_id = %id, statut = %status, "Parcel status updated");
    Ok(Json(parcel))
}
