use crate::auth::models::AdminContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::{extract_document_upload, sanitize_filename};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use parcelvault_core::models::DocumentFile;
use parcelvault_core::AppError;
use parcelvault_storage::document_storage_key;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadDocumentResponse {
    pub message: String,
    /// Storage key of the stored PDF.
    pub filename: String,
    pub document: DocumentFile,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DeleteDocumentQuery {
    /// Remove only this record. Without it every record of the type is removed.
    pub document_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteDocumentResponse {
    pub message: String,
    pub removed: usize,
}

#[utoipa::path(
    post,
    path = "/api/admin/upload/document/{parcelle_id}",
    tag = "admin",
    params(("parcelle_id" = String, Path, description = "Parcel ID")),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Document stored", body = UploadDocumentResponse),
        (status = 400, description = "Not a PDF or missing document_type", body = ErrorResponse),
        (status = 404, description = "Parcel not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    admin: AdminContext,
    Path(parcelle_id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    if state.db.parcels.get(&parcelle_id).await?.is_none() {
        return Err(AppError::ParcelNotFound(parcelle_id).into());
    }

    let upload = extract_document_upload(multipart).await?;
    state.documents.validator.validate_all(
        Some(&upload.filename),
        upload.content_type.as_deref(),
        &upload.data,
    )?;
    let original_name = sanitize_filename(&upload.filename)?;

    let key = document_storage_key(&parcelle_id, &upload.document_type);
    let size = upload.data.len();
    state
        .documents
        .storage
        .upload_with_key(&key, upload.data, "application/pdf")
        .await?;

    let record = DocumentFile {
        id: Uuid::new_v4().to_string(),
        document_type: upload.document_type.clone(),
        stored_path: key.clone(),
        original_name,
        uploaded_at: Some(Utc::now()),
    };

    if let Err(e) = state
        .db
        .parcels
        .add_document(&parcelle_id, record.clone())
        .await
    {
        if let Err(cleanup) = state.documents.storage.delete(&key).await {
            tracing::warn!(error = %cleanup, storage_key = %key, "Failed to remove orphaned upload");
        }
        return Err(e.into());
    }

    tracing::info!(
        admin = %admin.username,
        parcel_id = %parcelle_id,
        document_type = %record.document_type,
        storage_key = %key,
        size,
        "Official document uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadDocumentResponse {
            message: "Document uploaded".to_string(),
            filename: key,
            document: record,
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/admin/document/{parcelle_id}/{document_type}",
    tag = "admin",
    params(
        ("parcelle_id" = String, Path, description = "Parcel ID"),
        ("document_type" = String, Path, description = "Document type"),
        DeleteDocumentQuery
    ),
    responses(
        (status = 200, description = "Records and files removed", body = DeleteDocumentResponse),
        (status = 404, description = "Parcel or document not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    admin: AdminContext,
    Path((parcelle_id, document_type)): Path<(String, String)>,
    Query(query): Query<DeleteDocumentQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let removed = state
        .db
        .parcels
        .remove_documents(&parcelle_id, &document_type, query.document_id.as_deref())
        .await?;

    for file in &removed {
        if let Err(e) = state.documents.storage.delete(&file.stored_path).await {
            tracing::warn!(error = %e, storage_key = %file.stored_path, "Stored document already gone");
        }
    }

    tracing::info!(
        admin = %admin.username,
        parcel_id = %parcelle_id,
        document_type = %document_type,
        removed = removed.len(),
        "Official document removed"
    );

    Ok(Json(DeleteDocumentResponse {
        message: "Document deleted".to_string(),
        removed: removed.len(),
    }))
}
