//! Administrator authentication: token issuance, verification and the bearer guard.

pub mod jwt;
pub mod middleware;
pub mod models;

pub use jwt::JwtService;
pub use middleware::{require_admin, AuthFailureLimiter, AuthState};
pub use models::{AdminClaims, AdminContext};
