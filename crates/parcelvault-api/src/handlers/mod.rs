pub mod access_codes;
pub mod admin_documents;
pub mod audit;
pub mod auth;
pub mod code_requests;
pub mod delivery;
pub mod documents;
pub mod parcels;
pub mod surveillance;
pub mod verification;
