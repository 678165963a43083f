//! Locates the source of a requested document: the current uploaded file, or a
//! specimen when nothing has been uploaded for a type that has a generator.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parcelvault_core::models::{
    document_label, has_placeholder, is_valid_document_type, DocumentFile, Parcel,
    CURRENT_SELECTION_POLICY,
};
use parcelvault_core::AppError;
use parcelvault_db::ParcelRepository;
use parcelvault_processing::PlaceholderContext;
use parcelvault_storage::Storage;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::HttpAppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Uploaded,
    Placeholder,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Uploaded => "uploaded",
            SourceKind::Placeholder => "placeholder",
        }
    }
}

#[derive(Debug, Clone)]
pub enum DocumentSource {
    Uploaded(DocumentFile),
    Placeholder,
}

impl DocumentSource {
    pub fn kind(&self) -> SourceKind {
        match self {
            DocumentSource::Uploaded(_) => SourceKind::Uploaded,
            DocumentSource::Placeholder => SourceKind::Placeholder,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedDocument {
    pub parcel: Parcel,
    pub document_type: String,
    pub label: String,
    pub source: DocumentSource,
}

impl ResolvedDocument {
    /// What a specimen for this parcel should print.
    pub fn placeholder_context(&self, code: Option<&str>, now: DateTime<Utc>) -> PlaceholderContext {
        placeholder_context(&self.parcel, code, now)
    }
}

pub fn placeholder_context(parcel: &Parcel, code: Option<&str>, now: DateTime<Utc>) -> PlaceholderContext {
    PlaceholderContext {
        parcel_name: parcel.nom.clone(),
        reference: parcel.display_reference().to_string(),
        superficie: parcel.superficie,
        unite_superficie: parcel.unite_superficie.clone(),
        commune: parcel.commune.clone(),
        coordinates: parcel.coordinates.clone(),
        code: code.map(str::to_string),
        generated_at: now,
    }
}

#[derive(Clone)]
pub struct DocumentResolver {
    parcels: ParcelRepository,
    storage: Arc<dyn Storage>,
}

impl DocumentResolver {
    pub fn new(parcels: ParcelRepository, storage: Arc<dyn Storage>) -> Self {
        Self { parcels, storage }
    }

    #[tracing::instrument(skip(self))]
    pub async fn resolve(
        &self,
        parcel_id: &str,
        document_type: &str,
    ) -> Result<ResolvedDocument, AppError> {
        let parcel = self
            .parcels
            .get(parcel_id)
            .await?
            .ok_or_else(|| AppError::ParcelNotFound(parcel_id.to_string()))?;

        if !is_valid_document_type(document_type) {
            return Err(AppError::UnsupportedDocumentType(document_type.to_string()));
        }

        let current = parcel
            .official_documents
            .current(document_type, CURRENT_SELECTION_POLICY)
            .cloned();

        let source = match current {
            Some(file) => {
                let present = self
                    .storage
                    .exists(&file.stored_path)
                    .await
                    .map_err(|e| HttpAppError::from(e).0)?;
                if !present {
                    return Err(AppError::DocumentFileMissing {
                        parcel_id: parcel_id.to_string(),
                        document_type: document_type.to_string(),
                        path: file.stored_path,
                    });
                }
                DocumentSource::Uploaded(file)
            }
            None if has_placeholder(document_type) => DocumentSource::Placeholder,
            None => return Err(AppError::UnsupportedDocumentType(document_type.to_string())),
        };

        Ok(ResolvedDocument {
            parcel,
            document_type: document_type.to_string(),
            label: document_label(document_type),
            source,
        })
    }

    /// Raw bytes of an uploaded source. Specimens are generated by the release pipeline.
    pub async fn load_uploaded(&self, file: &DocumentFile) -> Result<Vec<u8>, AppError> {
        self.storage
            .download(&file.stored_path)
            .await
            .map_err(|e| HttpAppError::from(e).0)
    }
}
