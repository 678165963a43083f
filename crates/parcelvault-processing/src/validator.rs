use std::path::Path;

/// Upload validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid file extension: {0} (only .pdf is accepted)")]
    InvalidExtension(String),

    #[error("Invalid content type: {0} (expected application/pdf)")]
    InvalidContentType(String),

    #[error("File content is not a PDF")]
    NotPdf,

    #[error("Empty file")]
    EmptyFile,
}

const PDF_MAGIC: &[u8] = b"%PDF-";
const PDF_CONTENT_TYPES: [&str; 3] = ["application/pdf", "application/x-pdf", "application/octet-stream"];

/// Checks applied to every official document upload.
#[derive(Debug, Clone)]
pub struct PdfValidator {
    max_file_size: usize,
}

impl PdfValidator {
    pub fn new(max_file_size: usize) -> Self {
        Self { max_file_size }
    }

    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }
        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }
        Ok(())
    }

    /// A missing file name is accepted; a present one must end in `.pdf`.
    pub fn validate_extension(&self, filename: Option<&str>) -> Result<(), ValidationError> {
        let Some(filename) = filename.filter(|f| !f.is_empty()) else {
            return Ok(());
        };
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        if extension != "pdf" {
            return Err(ValidationError::InvalidExtension(filename.to_string()));
        }
        Ok(())
    }

    /// Browsers sometimes send `application/octet-stream` for PDFs; the magic
    /// bytes check is what actually decides.
    pub fn validate_content_type(&self, content_type: Option<&str>) -> Result<(), ValidationError> {
        let Some(content_type) = content_type else {
            return Ok(());
        };
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        if !PDF_CONTENT_TYPES.contains(&essence.as_str()) {
            return Err(ValidationError::InvalidContentType(content_type.to_string()));
        }
        Ok(())
    }

    pub fn validate_magic(&self, data: &[u8]) -> Result<(), ValidationError> {
        // Some generators emit a few bytes of junk before the header.
        let head = &data[..data.len().min(1024)];
        if head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC) {
            Ok(())
        } else {
            Err(ValidationError::NotPdf)
        }
    }

    pub fn validate_all(
        &self,
        filename: Option<&str>,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Result<(), ValidationError> {
        self.validate_file_size(data.len())?;
        self.validate_extension(filename)?;
        self.validate_content_type(content_type)?;
        self.validate_magic(data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_pdf() {
        let validator = PdfValidator::new(1024);
        assert!(validator
            .validate_all(Some("ACD_scan.PDF"), Some("application/pdf"), b"%PDF-1.7\n...")
            .is_ok());
        assert!(validator
            .validate_all(None, Some("application/octet-stream"), b"%PDF-1.4")
            .is_ok());
    }

    #[test]
    fn test_rejects_non_pdf() {
        let validator = PdfValidator::new(1024);
        assert!(matches!(
            validator.validate_all(Some("photo.jpg"), None, b"%PDF-1.4"),
            Err(ValidationError::InvalidExtension(_))
        ));
        assert!(matches!(
            validator.validate_all(Some("a.pdf"), Some("image/png"), b"%PDF-1.4"),
            Err(ValidationError::InvalidContentType(_))
        ));
        assert!(matches!(
            validator.validate_all(Some("a.pdf"), None, b"\x89PNG\r\n"),
            Err(ValidationError::NotPdf)
        ));
    }

    #[test]
    fn test_size_limits() {
        let validator = PdfValidator::new(8);
        assert!(matches!(
            validator.validate_file_size(0),
            Err(ValidationError::EmptyFile)
        ));
        assert!(matches!(
            validator.validate_file_size(9),
            Err(ValidationError::FileTooLarge { size: 9, max: 8 })
        ));
    }
}
