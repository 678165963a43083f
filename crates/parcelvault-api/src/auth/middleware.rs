use crate::auth::jwt::JwtService;
use crate::auth::models::AdminContext;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use parcelvault_core::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;

/// Per-client count of failed bearer checks inside a fixed window.
#[derive(Clone)]
pub struct AuthFailureLimiter {
    inner: Arc<Mutex<HashMap<String, (u32, Instant)>>>,
    max_failures: u32,
    window: Duration,
}

impl AuthFailureLimiter {
    pub fn new(max_failures: u32, window_seconds: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            max_failures,
            window: Duration::from_secs(window_seconds),
        }
    }

    /// Returns true once the client has reached the limit.
    pub async fn record_failure(&self, ip: &str) -> bool {
        let mut guard = self.inner.lock().await;
        let now = Instant::now();
        let (count, reset_at) = guard
            .entry(ip.to_string())
            .or_insert((0, now + self.window));
        if now >= *reset_at {
            *count = 0;
            *reset_at = now + self.window;
        }
        *count += 1;
        *count >= self.max_failures
    }

    pub async fn is_blocked(&self, ip: &str) -> bool {
        let mut guard = self.inner.lock().await;
        if let Some((count, reset_at)) = guard.get(ip) {
            if Instant::now() >= *reset_at {
                guard.remove(ip);
                return false;
            }
            return *count >= self.max_failures;
        }
        false
    }
}

#[derive(Clone)]
pub struct AuthState {
    pub jwt: JwtService,
    pub admin_username: String,
    pub admin_password: String,
    pub auth_failure_limiter: Option<Arc<AuthFailureLimiter>>,
}

impl AuthState {
    /// Constant-time check of both fields; the username check is not short-circuited.
    pub fn credentials_match(&self, username: &str, password: &str) -> bool {
        let user_ok = secure_compare(username, &self.admin_username);
        let pass_ok = secure_compare(password, &self.admin_password);
        user_ok & pass_ok
    }
}

pub(crate) fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// First hop of `X-Forwarded-For`, then `X-Real-IP`, else "unknown".
pub(crate) fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| ip.parse::<std::net::IpAddr>().is_ok())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(str::trim)
                .filter(|ip| ip.parse::<std::net::IpAddr>().is_ok())
        })
        .unwrap_or("unknown")
        .to_string()
}

fn too_many_attempts() -> Response {
    (StatusCode::TOO_MANY_REQUESTS, "Too many failed auth attempts").into_response()
}

async fn reject(auth_state: &AuthState, ip: &str, reason: &str) -> Response {
    if let Some(ref limiter) = auth_state.auth_failure_limiter {
        if limiter.record_failure(ip).await {
            tracing::warn!(client_ip = %ip, "Admin authentication throttled");
            return too_many_attempts();
        }
    }
    tracing::debug!(client_ip = %ip, reason, "Admin authentication failed");
    HttpAppError(AppError::Unauthorized(reason.to_string())).into_response()
}

/// Bearer guard for every `/admin` route.
pub async fn require_admin(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(request.headers());
    if let Some(ref limiter) = auth_state.auth_failure_limiter {
        if limiter.is_blocked(&ip).await {
            return too_many_attempts();
        }
    }

    let Some(auth_header) = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    else {
        return reject(&auth_state, &ip, "Missing authorization header").await;
    };

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        return reject(&auth_state, &ip, "Invalid authorization header format").await;
    };

    match auth_state.jwt.verify(token.trim()) {
        Ok(claims) => {
            request.extensions_mut().insert(AdminContext {
                username: claims.sub,
                client_ip: ip,
            });
            next.run(request).await
        }
        Err(_) => reject(&auth_state, &ip, "Invalid or expired token").await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_secure_compare() {
        assert!(secure_compare("admin", "admin"));
        assert!(!secure_compare("admin", "admiN"));
        assert!(!secure_compare("admin", "admin1"));
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_ip(&headers), "203.0.113.9");

        headers.remove("x-forwarded-for");
        assert_eq!(client_ip(&headers), "198.51.100.2");

        assert_eq!(client_ip(&HeaderMap::new()), "unknown");
    }

    #[tokio::test]
    async fn test_limiter_blocks_after_max_failures() {
        let limiter = AuthFailureLimiter::new(3, 60);
        assert!(!limiter.record_failure("1.2.3.4").await);
        assert!(!limiter.record_failure("1.2.3.4").await);
        assert!(!limiter.is_blocked("1.2.3.4").await);
        assert!(limiter.record_failure("1.2.3.4").await);
        assert!(limiter.is_blocked("1.2.3.4").await);
        assert!(!limiter.is_blocked("5.6.7.8").await);
    }

    #[test]
    fn test_credentials_match() {
        let state = AuthState {
            jwt: JwtService::new("a-test-secret-that-is-long-enough-123", 1),
            admin_username: "admin".to_string(),
            admin_password: "s3cret".to_string(),
            auth_failure_limiter: None,
        };
        assert!(state.credentials_match("admin", "s3cret"));
        assert!(!state.credentials_match("admin", "wrong"));
        assert!(!state.credentials_match("root", "s3cret"));
    }
}
