//! Multipart parsing for official document uploads

use axum::extract::Multipart;
use parcelvault_core::models::is_valid_document_type;
use parcelvault_core::AppError;

/// One parsed upload form: the PDF and the type it is filed under.
#[derive(Debug)]
pub struct DocumentUpload {
    pub data: Vec<u8>,
    pub filename: String,
    pub content_type: Option<String>,
    pub document_type: String,
}

/// Read the `file` and `document_type` fields.
/// Only one field named "file" is accepted; multiple file fields are rejected.
pub async fn extract_document_upload(mut multipart: Multipart) -> Result<DocumentUpload, AppError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut document_type: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match field_name.as_str() {
            "file" => {
                if file_data.is_some() {
                    return Err(AppError::InvalidInput(
                        "Multiple file fields are not allowed; send exactly one field named 'file'"
                            .to_string(),
                    ));
                }
                filename = field.file_name().map(|s: &str| s.to_string());
                content_type = field.content_type().map(|s: &str| s.to_string());

                let data = field.bytes().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read file data: {}", e))
                })?;
                file_data = Some(data.to_vec());
            }
            "document_type" => {
                let value = field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read document_type: {}", e))
                })?;
                document_type = Some(value.trim().to_lowercase());
            }
            _ => {}
        }
    }

    let data = file_data.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;
    let document_type = document_type
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::InvalidInput("document_type is required".to_string()))?;
    if !is_valid_document_type(&document_type) {
        return Err(AppError::InvalidInput(format!(
            "Invalid document_type '{}'",
            document_type
        )));
    }

    Ok(DocumentUpload {
        data,
        filename: filename.unwrap_or_else(|| "document.pdf".to_string()),
        content_type,
        document_type,
    })
}

/// Sanitize filename to prevent path traversal and invalid characters.
/// Returns an error if the filename contains path traversal attempts.
pub fn sanitize_filename(filename: &str) -> Result<String, AppError> {
    const MAX_FILENAME_LENGTH: usize = 255;

    let path = std::path::Path::new(filename);
    let filename_only = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    if filename_only.contains("..") {
        return Err(AppError::InvalidInput(
            "Filename contains invalid path traversal".to_string(),
        ));
    }

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim().is_empty() || sanitized.len() < 3 {
        return Ok("document.pdf".to_string());
    }

    Ok(sanitized)
}
