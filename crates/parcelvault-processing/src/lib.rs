//! ParcelVault document processing
//!
//! PDF work for the release pipeline: validating uploads, stamping a per-recipient
//! watermark on every released copy, and generating specimen documents for parcels
//! whose paperwork has not been digitized yet. All operations are synchronous and
//! CPU-bound; callers run them on a blocking worker.

pub mod error;
mod pdf;
pub mod validator;

#[cfg(feature = "placeholder")]
pub mod placeholder;
#[cfg(feature = "watermark")]
pub mod watermark;

pub use error::ProcessingError;
pub use validator::{PdfValidator, ValidationError};

#[cfg(feature = "placeholder")]
pub use placeholder::{PlaceholderContext, PlaceholderGenerator, SPECIMEN_MARK};
#[cfg(feature = "watermark")]
pub use watermark::{WatermarkConfig, Watermarker};

/// Timestamp format printed on stamps and specimens.
pub fn format_stamp_time(issued_at: chrono::DateTime<chrono::Utc>) -> String {
    issued_at.format("%d/%m/%Y %H:%M").to_string()
}

/// Number of pages in a PDF.
pub fn page_count(data: &[u8]) -> Result<usize, ProcessingError> {
    let doc = lopdf::Document::load_mem(data)?;
    Ok(doc.get_pages().len())
}
