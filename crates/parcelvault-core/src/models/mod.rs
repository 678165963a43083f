//! Data models for the portal
//!
//! Access codes and their grants, the parcel catalog entries documents hang off,
//! the download audit trail and the pre-code access request queue.

mod access_code;
mod access_request;
mod audit;
mod document;
mod parcel;

pub use access_code::*;
pub use access_request::*;
pub use audit::*;
pub use document::*;
pub use parcel::*;
