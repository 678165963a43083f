//! Error types module
//!
//! All failures in ParcelVault are unified under [`AppError`]. Each variant
//! self-describes how it is presented over HTTP through [`ErrorMetadata`].
//!
//! Access denials (`InvalidCode`, `RevokedCode`, `ExpiredCode`, `OutOfScope`) share
//! one status, one error code and one client message so a caller guessing codes
//! learns nothing about why a guess failed. The precise reason stays in the logs.

use std::io;

use crate::generator::redact_code;

/// Client-facing message for every access denial.
pub const ACCESS_DENIED_MESSAGE: &str = "Invalid, expired or unauthorized access code";

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for denials and recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "ACCESS_DENIED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid access code: {}", redact_code(.0))]
    InvalidCode(String),

    #[error("Access code revoked: {}", redact_code(.0))]
    RevokedCode(String),

    #[error("Access code expired: {}", redact_code(.0))]
    ExpiredCode(String),

    #[error("Access code {} is not valid for parcel {parcel_id}", redact_code(.code))]
    OutOfScope { code: String, parcel_id: String },

    #[error("Parcel not found: {0}")]
    ParcelNotFound(String),

    #[error("Document file missing for parcel {parcel_id} ({document_type}): {path}")]
    DocumentFileMissing {
        parcel_id: String,
        document_type: String,
        path: String,
    },

    #[error("Unsupported document type: {0}")]
    UnsupportedDocumentType(String),

    #[error("Watermark composition failed: {0}")]
    WatermarkComposition(String),

    #[error("Store write conflict: {0}")]
    StoreWriteConflict(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::InvalidCode(_)
        | AppError::RevokedCode(_)
        | AppError::ExpiredCode(_)
        | AppError::OutOfScope { .. } => (
            403,
            "ACCESS_DENIED",
            false,
            Some("Request a new access code from the administrator"),
            false,
            LogLevel::Warn,
        ),
        AppError::ParcelNotFound(_) => (
            404,
            "PARCEL_NOT_FOUND",
            false,
            Some("Verify the parcel ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::DocumentFileMissing { .. } => (
            404,
            "DOCUMENT_FILE_MISSING",
            false,
            Some("Ask the administrator to upload the document again"),
            true,
            LogLevel::Error,
        ),
        AppError::UnsupportedDocumentType(_) => (
            404,
            "UNSUPPORTED_DOCUMENT_TYPE",
            false,
            Some("Request one of the available document types"),
            false,
            LogLevel::Debug,
        ),
        AppError::WatermarkComposition(_) => (
            500,
            "WATERMARK_FAILED",
            false,
            Some("Contact support if this error persists"),
            true,
            LogLevel::Error,
        ),
        AppError::StoreWriteConflict(_) => (
            409,
            "STORE_WRITE_CONFLICT",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Warn,
        ),
        AppError::Storage(_) => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::BadRequest(_) => (
            400,
            "BAD_REQUEST",
            false,
            Some("Check request format and parameters"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the resource ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::PayloadTooLarge(_) => (
            413,
            "PAYLOAD_TOO_LARGE",
            false,
            Some("Reduce file size"),
            false,
            LogLevel::Debug,
        ),
        AppError::Unauthorized(_) => (
            401,
            "UNAUTHORIZED",
            false,
            Some("Log in again to obtain a fresh token"),
            false,
            LogLevel::Debug,
        ),
        AppError::ServiceUnavailable(_) => (
            503,
            "SERVICE_UNAVAILABLE",
            true,
            Some("Use another delivery method or retry later"),
            false,
            LogLevel::Warn,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::InvalidCode(_) => "InvalidCode",
            AppError::RevokedCode(_) => "RevokedCode",
            AppError::ExpiredCode(_) => "ExpiredCode",
            AppError::OutOfScope { .. } => "OutOfScope",
            AppError::ParcelNotFound(_) => "ParcelNotFound",
            AppError::DocumentFileMissing { .. } => "DocumentFileMissing",
            AppError::UnsupportedDocumentType(_) => "UnsupportedDocumentType",
            AppError::WatermarkComposition(_) => "WatermarkComposition",
            AppError::StoreWriteConflict(_) => "StoreWriteConflict",
            AppError::Storage(_) => "Storage",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::BadRequest(_) => "BadRequest",
            AppError::NotFound(_) => "NotFound",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::ServiceUnavailable(_) => "ServiceUnavailable",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// True for the four code/scope/expiry failures that surface as a generic denial.
    pub fn is_access_denial(&self) -> bool {
        matches!(
            self,
            AppError::InvalidCode(_)
                | AppError::RevokedCode(_)
                | AppError::ExpiredCode(_)
                | AppError::OutOfScope { .. }
        )
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidCode(_)
            | AppError::RevokedCode(_)
            | AppError::ExpiredCode(_)
            | AppError::OutOfScope { .. } => ACCESS_DENIED_MESSAGE.to_string(),
            AppError::ParcelNotFound(_) => "Parcel not found".to_string(),
            AppError::DocumentFileMissing { .. } => "Document file is unavailable".to_string(),
            AppError::UnsupportedDocumentType(ref doc_type) => {
                format!("Document type '{}' is not available", doc_type)
            }
            AppError::WatermarkComposition(_) => "Failed to prepare document".to_string(),
            AppError::StoreWriteConflict(_) => "Concurrent update, please retry".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::BadRequest(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::PayloadTooLarge(ref msg) => msg.clone(),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::ServiceUnavailable(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}
