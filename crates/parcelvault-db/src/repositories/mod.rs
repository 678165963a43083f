//! Domain repositories over the shared [`Store`](crate::store::Store).
//!
//! Each repository is a cheap `Clone` handle; they all share one store so writes
//! to different collections are still serialized against each other.

mod access_codes;
mod access_requests;
mod download_logs;
mod parcels;

pub use access_codes::{AccessCodeRepository, CodeGenerator, MAX_GENERATION_ATTEMPTS};
pub use access_requests::AccessRequestRepository;
pub use download_logs::DownloadLogRepository;
pub use parcels::ParcelRepository;
