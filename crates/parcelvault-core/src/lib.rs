//! ParcelVault Core Library
//!
//! Domain models, error types, configuration, the access-code generator and the
//! profile policy table shared by every ParcelVault component.

pub mod config;
pub mod error;
pub mod generator;
pub mod models;
pub mod policy;

// Re-export commonly used types
pub use config::{BaseConfig, Config, PortalConfig, StoreBackend};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use generator::{generate_code, redact_code, CODE_ALPHABET, DEFAULT_CODE_LENGTH};
pub use policy::{Decision, DenialReason, ProfilePolicy};
