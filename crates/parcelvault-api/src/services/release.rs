//! Document release pipeline.
//!
//! resolve -> load or generate -> stamp -> audit. PDF work runs on a blocking
//! worker, and at most `workers` compositions run at once.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parcelvault_core::models::{DocumentFile, DownloadLogEntry};
use parcelvault_core::{AppError, Decision};
use parcelvault_db::DownloadLogRepository;
use parcelvault_processing::{PlaceholderContext, PlaceholderGenerator, Watermarker};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use utoipa::ToSchema;

use crate::services::document_resolver::{
    DocumentResolver, DocumentSource, ResolvedDocument, SourceKind,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseAction {
    Preview,
    #[default]
    Download,
    Info,
}

/// A composed copy ready to hand to the caller.
#[derive(Debug, Clone)]
pub struct ReleasedDocument {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub document_type: String,
    pub label: String,
    pub parcel_name: String,
    pub source: SourceKind,
    pub watermarked: bool,
}

/// Metadata answer for `action=info`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DocumentInfo {
    pub parcelle_id: String,
    pub document_type: String,
    pub label: String,
    pub source: SourceKind,
    pub watermarked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// `{nom}_{type}.pdf` restricted to characters safe in a Content-Disposition header.
pub fn download_filename(parcel_name: &str, document_type: &str) -> String {
    let stem: String = format!("{}_{}", parcel_name.trim(), document_type)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}.pdf", stem)
}

struct Stamp {
    client_name: String,
    code: String,
}

/// Everything one composition needs, moved onto the blocking worker.
struct ComposeJob {
    original: Option<Vec<u8>>,
    document_type: String,
    specimen: PlaceholderContext,
    stamp: Option<Stamp>,
    issued_at: DateTime<Utc>,
    watermarker: Watermarker,
    placeholders: PlaceholderGenerator,
}

impl ComposeJob {
    fn run(self) -> Result<(Vec<u8>, SourceKind), AppError> {
        let Some(original) = self.original.as_deref() else {
            return self.specimen().map(|pdf| (pdf, SourceKind::Placeholder));
        };
        let Some(stamp) = &self.stamp else {
            return Ok((original.to_vec(), SourceKind::Uploaded));
        };

        match self
            .watermarker
            .stamp(original, &stamp.client_name, &stamp.code, self.issued_at)
        {
            Ok(stamped) => Ok((stamped, SourceKind::Uploaded)),
            Err(err) if self.placeholders.supports(&self.document_type) => {
                tracing::warn!(
                    error = %err,
                    document_type = %self.document_type,
                    "Watermark composition failed, serving a specimen instead"
                );
                self.specimen().map(|pdf| (pdf, SourceKind::Placeholder))
            }
            Err(err) => Err(AppError::WatermarkComposition(err.to_string())),
        }
    }

    fn specimen(&self) -> Result<Vec<u8>, AppError> {
        let pdf = self
            .placeholders
            .generate(&self.document_type, &self.specimen)?;
        match &self.stamp {
            Some(stamp) => Ok(self.watermarker.stamp(
                &pdf,
                &stamp.client_name,
                &stamp.code,
                self.issued_at,
            )?),
            None => Ok(pdf),
        }
    }
}

#[derive(Clone)]
pub struct ReleaseService {
    resolver: DocumentResolver,
    download_logs: DownloadLogRepository,
    watermarker: Watermarker,
    placeholders: PlaceholderGenerator,
    workers: Arc<Semaphore>,
}

impl ReleaseService {
    pub fn new(
        resolver: DocumentResolver,
        download_logs: DownloadLogRepository,
        watermarker: Watermarker,
        workers: usize,
    ) -> Self {
        Self {
            resolver,
            download_logs,
            watermarker,
            placeholders: PlaceholderGenerator::new(),
            workers: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Metadata only: nothing is composed and nothing is audited.
    pub async fn describe(
        &self,
        decision: &Decision,
        document_type: &str,
    ) -> Result<DocumentInfo, AppError> {
        let resolved = self
            .resolver
            .resolve(&decision.parcel_id, document_type)
            .await?;
        let (original_name, uploaded_at) = match &resolved.source {
            DocumentSource::Uploaded(file) => (Some(file.original_name.clone()), file.uploaded_at),
            DocumentSource::Placeholder => (None, None),
        };
        Ok(DocumentInfo {
            parcelle_id: decision.parcel_id.clone(),
            document_type: resolved.document_type.clone(),
            label: resolved.label.clone(),
            source: resolved.source.kind(),
            watermarked: decision.show_watermark,
            original_name,
            uploaded_at,
        })
    }

    /// Compose the copy `decision` entitles its holder to. Does not audit.
    #[tracing::instrument(skip(self, decision), fields(parcel_id = %decision.parcel_id, source = tracing::field::Empty))]
    pub async fn release(
        &self,
        decision: &Decision,
        document_type: &str,
    ) -> Result<ReleasedDocument, AppError> {
        let resolved = self
            .resolver
            .resolve(&decision.parcel_id, document_type)
            .await?;
        let original = match &resolved.source {
            DocumentSource::Uploaded(file) => Some(self.load(file).await?),
            DocumentSource::Placeholder => None,
        };

        let now = Utc::now();
        let job = ComposeJob {
            original,
            document_type: resolved.document_type.clone(),
            specimen: resolved.placeholder_context(Some(&decision.code), now),
            stamp: decision.show_watermark.then(|| Stamp {
                client_name: decision.client_name.clone(),
                code: decision.code.clone(),
            }),
            issued_at: now,
            watermarker: self.watermarker.clone(),
            placeholders: self.placeholders,
        };
        let (bytes, source) = self.compose(job).await?;
        tracing::Span::current().record("source", source.as_str());

        Ok(self.finish(resolved, bytes, source, decision.show_watermark))
    }

    /// Release for preview or download and append the audit entry.
    pub async fn release_and_record(
        &self,
        decision: &Decision,
        document_type: &str,
    ) -> Result<ReleasedDocument, AppError> {
        let released = self.release(decision, document_type).await?;
        self.record(decision, &released.document_type, &released.label)
            .await?;
        Ok(released)
    }

    /// Append one audit entry for a completed release.
    pub async fn record(
        &self,
        decision: &Decision,
        audited_type: &str,
        label: &str,
    ) -> Result<(), AppError> {
        self.download_logs
            .append(DownloadLogEntry::new(
                decision.code.clone(),
                decision.client_name.clone(),
                decision.parcel_id.clone(),
                audited_type,
                label,
                Utc::now(),
            ))
            .await
    }

    async fn load(&self, file: &DocumentFile) -> Result<Vec<u8>, AppError> {
        self.resolver.load_uploaded(file).await
    }

    async fn compose(&self, job: ComposeJob) -> Result<(Vec<u8>, SourceKind), AppError> {
        let _permit = self
            .workers
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| AppError::Internal(format!("Release worker pool closed: {}", e)))?;

        tokio::task::spawn_blocking(move || job.run())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to spawn blocking task");
                AppError::Internal(e.to_string())
            })?
    }

    fn finish(
        &self,
        resolved: ResolvedDocument,
        bytes: Vec<u8>,
        source: SourceKind,
        watermarked: bool,
    ) -> ReleasedDocument {
        ReleasedDocument {
            filename: download_filename(&resolved.parcel.nom, &resolved.document_type),
            bytes,
            document_type: resolved.document_type,
            label: resolved.label,
            parcel_name: resolved.parcel.nom,
            source,
            watermarked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(original: Option<Vec<u8>>, document_type: &str, stamp: bool) -> ComposeJob {
        let now = Utc::now();
        ComposeJob {
            original,
            document_type: document_type.to_string(),
            specimen: PlaceholderContext {
                parcel_name: "Parcelle A".to_string(),
                reference: "TF 223737".to_string(),
                superficie: 2.5,
                unite_superficie: "ha".to_string(),
                commune: "Songon".to_string(),
                coordinates: vec![],
                code: Some("DJ9MFX7J".to_string()),
                generated_at: now,
            },
            stamp: stamp.then(|| Stamp {
                client_name: "Jean Dupont".to_string(),
                code: "DJ9MFX7J".to_string(),
            }),
            issued_at: now,
            watermarker: Watermarker::default(),
            placeholders: PlaceholderGenerator::new(),
        }
    }

    #[test]
    fn test_download_filename() {
        assert_eq!(download_filename("Parcelle A", "acd"), "Parcelle_A_acd.pdf");
        assert_eq!(download_filename("Lot \"7\"/B", "plan"), "Lot__7__B_plan.pdf");
    }

    #[test]
    fn test_unreadable_original_falls_back_to_specimen() {
        let (bytes, source) = job(Some(b"not a pdf".to_vec()), "acd", true).run().unwrap();
        assert_eq!(source, SourceKind::Placeholder);
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_unreadable_original_without_generator_is_an_error() {
        let err = job(Some(b"not a pdf".to_vec()), "titre_foncier", true)
            .run()
            .unwrap_err();
        assert!(matches!(err, AppError::WatermarkComposition(_)));
    }

    #[test]
    fn test_unstamped_original_is_passed_through() {
        let (bytes, source) = job(Some(b"%PDF-1.4 raw".to_vec()), "acd", false).run().unwrap();
        assert_eq!(source, SourceKind::Uploaded);
        assert_eq!(bytes, b"%PDF-1.4 raw");
    }

    #[test]
    fn test_specimen_generated_when_nothing_uploaded() {
        let (bytes, source) = job(None, "plan", false).run().unwrap();
        assert_eq!(source, SourceKind::Placeholder);
        assert!(!bytes.is_empty());
    }
}
