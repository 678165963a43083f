//! ParcelVault Storage Library
//!
//! Byte storage for uploaded official documents. The access core only needs to put,
//! fetch, probe and delete files by key; [`LocalStorage`] keeps them on disk.
//!
//! # Storage key format
//!
//! `documents/{parcel_id}/{document_type}_{id8}.pdf`. Keys must not contain `..` or a
//! leading `/`. Key generation lives in [`keys`] so every caller agrees on the layout.

pub mod keys;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use keys::document_storage_key;
pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};
