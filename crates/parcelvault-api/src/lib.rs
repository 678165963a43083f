//! ParcelVault API Library
//!
//! HTTP surface of the parcel document portal: code verification, document release,
//! delivery, administration and the audit trail, plus application setup.

mod api_doc;
pub mod constants;
pub mod handlers;
pub mod services;
pub mod setup;
mod telemetry;
mod utils;

pub mod auth;
pub mod error;
pub mod state;

pub use error::ErrorResponse;
pub use services::{Mailer, OutgoingDocument};
pub use state::AppState;
