use parcelvault_core::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF has no pages")]
    NoPages,

    #[error("No specimen layout for document type {0}")]
    UnsupportedDocumentType(String),
}

impl From<ProcessingError> for AppError {
    fn from(err: ProcessingError) -> Self {
        match err {
            ProcessingError::UnsupportedDocumentType(doc_type) => {
                AppError::UnsupportedDocumentType(doc_type)
            }
            other => AppError::WatermarkComposition(other.to_string()),
        }
    }
}
