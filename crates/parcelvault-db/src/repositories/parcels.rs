use std::sync::Arc;

use parcelvault_core::models::{DocumentFile, Parcel, ParcelStatus};
use parcelvault_core::AppError;

use crate::store::Store;

/// Repository for the parcel catalog and the document records attached to it
#[derive(Clone)]
pub struct ParcelRepository {
    store: Arc<Store>,
}

fn parcel_not_found(id: &str) -> AppError {
    AppError::ParcelNotFound(id.to_string())
}

impl ParcelRepository {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Parcel>, AppError> {
        Ok(self.store.read().await.parcelles.clone())
    }

    pub async fn get(&self, id: &str) -> Result<Option<Parcel>, AppError> {
        let snap = self.store.read().await;
        Ok(snap.parcelles.iter().find(|p| p.id == id).cloned())
    }

    /// Add parcels whose id is not in the catalog yet. Existing ids are left untouched.
    ///
    /// Returns `(imported, total)`.
    #[tracing::instrument(skip(self, parcels), fields(db.table = "parcelles", db.operation = "insert", count = parcels.len()))]
    pub async fn import(&self, parcels: Vec<Parcel>) -> Result<(usize, usize), AppError> {
        let (imported, total) = self
            .store
            .write(|snap| {
                let mut imported = 0;
                for parcel in &parcels {
                    if snap.parcelles.iter().any(|p| p.id == parcel.id) {
                        continue;
                    }
                    snap.parcelles.push(parcel.clone());
                    imported += 1;
                }
                Ok((imported, snap.parcelles.len()))
            })
            .await?;

        tracing::info!(imported, total, "Parcels imported");
        Ok((imported, total))
    }

    #[tracing::instrument(skip(self), fields(db.table = "parcelles", db.operation = "update"))]
    pub async fn update_status(&self, id: &str, status: ParcelStatus) -> Result<Parcel, AppError> {
        self.store
            .write(|snap| {
                let parcel = snap
                    .parcelles
                    .iter_mut()
                    .find(|p| p.id == id)
                    .ok_or_else(|| parcel_not_found(id))?;
                parcel.statut = status;
                Ok(parcel.clone())
            })
            .await
    }

    /// Append an uploaded file record under its document type.
    #[tracing::instrument(skip(self, file), fields(db.table = "parcelles", db.operation = "update", document_type = %file.document_type))]
    pub async fn add_document(&self, parcel_id: &str, file: DocumentFile) -> Result<Parcel, AppError> {
        self.store
            .write(|snap| {
                let parcel = snap
                    .parcelles
                    .iter_mut()
                    .find(|p| p.id == parcel_id)
                    .ok_or_else(|| parcel_not_found(parcel_id))?;
                parcel.official_documents.push(file.clone());
                Ok(parcel.clone())
            })
            .await
    }

    /// Drop one record (by id) or every record of a type. Returns the removed records
    /// so the caller can delete their bytes.
    #[tracing::instrument(skip(self), fields(db.table = "parcelles", db.operation = "update"))]
    pub async fn remove_documents(
        &self,
        parcel_id: &str,
        document_type: &str,
        document_id: Option<&str>,
    ) -> Result<Vec<DocumentFile>, AppError> {
        self.store
            .write(|snap| {
                let parcel = snap
                    .parcelles
                    .iter_mut()
                    .find(|p| p.id == parcel_id)
                    .ok_or_else(|| parcel_not_found(parcel_id))?;
                let removed = parcel
                    .official_documents
                    .remove(document_type, document_id);
                if removed.is_empty() {
                    return Err(AppError::NotFound(format!(
                        "No {} document on parcel {}",
                        document_type, parcel_id
                    )));
                }
                Ok(removed)
            })
            .await
    }
}
