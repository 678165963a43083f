//! Configuration module
//!
//! Runtime configuration for the portal: server, admin authentication, data store,
//! uploaded-document storage, release pipeline and SMTP delivery settings.

use std::env;
use std::str::FromStr;

// Common constants
const SERVER_PORT: u16 = 8001;
const JWT_EXPIRY_HOURS: i64 = 24;
const MAX_DOCUMENT_SIZE_MB: usize = 20;
const DEFAULT_CODE_TTL_HOURS: i64 = 72;
const WATERMARK_OPACITY: f32 = 0.15;
const HTTP_CONCURRENCY_LIMIT: usize = 1_000;

/// Which backend holds the durable portal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local state, lost on restart. Used by tests and demos.
    Memory,
    /// A single JSON document on disk, rewritten atomically.
    JsonFile,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            "json" | "json-file" | "file" => Ok(StoreBackend::JsonFile),
            other => Err(anyhow::anyhow!(
                "Unknown STORE_BACKEND '{}'. Use 'json' or 'memory'",
                other
            )),
        }
    }
}

/// Settings shared by anything that serves HTTP
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub admin_username: String,
    pub admin_password: String,
    pub environment: String,
    pub http_concurrency_limit: usize,
}

/// Portal configuration
#[derive(Clone, Debug)]
pub struct PortalConfig {
    pub base: BaseConfig,
    // Data store
    pub store_backend: StoreBackend,
    pub data_file: String,
    // Uploaded official documents
    pub uploads_path: String,
    pub max_document_size_bytes: usize,
    // Release pipeline
    pub release_workers: usize,
    pub watermark_opacity: f32,
    pub default_code_ttl_hours: i64,
    // Email delivery
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_tls: bool,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<PortalConfig>);

impl Config {
    fn as_portal(&self) -> &PortalConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.as_portal().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = PortalConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_portal().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_portal().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_portal().base.cors_origins
    }

    pub fn jwt_secret(&self) -> &str {
        &self.as_portal().base.jwt_secret
    }

    pub fn jwt_expiry_hours(&self) -> i64 {
        self.as_portal().base.jwt_expiry_hours
    }

    pub fn admin_username(&self) -> &str {
        &self.as_portal().base.admin_username
    }

    pub fn admin_password(&self) -> &str {
        &self.as_portal().base.admin_password
    }

    pub fn environment(&self) -> &str {
        &self.as_portal().base.environment
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.as_portal().base.http_concurrency_limit
    }

    pub fn store_backend(&self) -> StoreBackend {
        self.as_portal().store_backend
    }

    pub fn data_file(&self) -> &str {
        &self.as_portal().data_file
    }

    pub fn uploads_path(&self) -> &str {
        &self.as_portal().uploads_path
    }

    pub fn max_document_size_bytes(&self) -> usize {
        self.as_portal().max_document_size_bytes
    }

    pub fn release_workers(&self) -> usize {
        self.as_portal().release_workers
    }

    pub fn watermark_opacity(&self) -> f32 {
        self.as_portal().watermark_opacity
    }

    pub fn default_code_ttl_hours(&self) -> i64 {
        self.as_portal().default_code_ttl_hours
    }

    pub fn smtp_host(&self) -> Option<&str> {
        self.as_portal().smtp_host.as_deref()
    }

    pub fn smtp_port(&self) -> Option<u16> {
        self.as_portal().smtp_port
    }

    pub fn smtp_user(&self) -> Option<&str> {
        self.as_portal().smtp_user.as_deref()
    }

    pub fn smtp_password(&self) -> Option<&str> {
        self.as_portal().smtp_password.as_deref()
    }

    pub fn smtp_from(&self) -> Option<&str> {
        self.as_portal().smtp_from.as_deref()
    }

    pub fn smtp_tls(&self) -> bool {
        self.as_portal().smtp_tls
    }
}

fn is_production_env(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_document_size_mb = env::var("MAX_DOCUMENT_SIZE_MB")
            .unwrap_or_else(|_| MAX_DOCUMENT_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_DOCUMENT_SIZE_MB);

        let default_workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(2);

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            jwt_expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| JWT_EXPIRY_HOURS.to_string())
                .parse()
                .unwrap_or(JWT_EXPIRY_HOURS),
            admin_username: env::var("ADMIN_USERNAME")
                .map_err(|_| anyhow::anyhow!("ADMIN_USERNAME must be set"))?,
            admin_password: env::var("ADMIN_PASSWORD")
                .map_err(|_| anyhow::anyhow!("ADMIN_PASSWORD must be set"))?,
            environment,
            http_concurrency_limit: env::var("HTTP_CONCURRENCY_LIMIT")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(HTTP_CONCURRENCY_LIMIT)
                .max(1),
        };

        Ok(PortalConfig {
            base,
            store_backend: env::var("STORE_BACKEND")
                .unwrap_or_else(|_| "json".to_string())
                .parse()?,
            data_file: env::var("DATA_FILE").unwrap_or_else(|_| "data/portal.json".to_string()),
            uploads_path: env::var("UPLOADS_PATH").unwrap_or_else(|_| "uploads".to_string()),
            max_document_size_bytes: max_document_size_mb * 1024 * 1024,
            release_workers: env::var("RELEASE_WORKERS")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(default_workers)
                .max(1),
            watermark_opacity: env::var("WATERMARK_OPACITY")
                .unwrap_or_else(|_| WATERMARK_OPACITY.to_string())
                .parse()
                .unwrap_or(WATERMARK_OPACITY),
            default_code_ttl_hours: env::var("DEFAULT_CODE_TTL_HOURS")
                .unwrap_or_else(|_| DEFAULT_CODE_TTL_HOURS.to_string())
                .parse()
                .unwrap_or(DEFAULT_CODE_TTL_HOURS),
            smtp_host: optional_var("SMTP_HOST"),
            smtp_port: optional_var("SMTP_PORT").and_then(|s| s.parse().ok()),
            smtp_user: optional_var("SMTP_USER"),
            smtp_password: optional_var("SMTP_PASSWORD"),
            smtp_from: optional_var("SMTP_FROM"),
            smtp_tls: env::var("SMTP_TLS")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if self.base.admin_username.trim().is_empty() || self.base.admin_password.is_empty() {
            return Err(anyhow::anyhow!(
                "ADMIN_USERNAME and ADMIN_PASSWORD must not be empty"
            ));
        }

        if self.store_backend == StoreBackend::JsonFile && self.data_file.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "DATA_FILE must be set when using the json store backend"
            ));
        }

        if !(self.watermark_opacity > 0.0 && self.watermark_opacity <= 0.5) {
            return Err(anyhow::anyhow!(
                "WATERMARK_OPACITY must be in (0, 0.5], got {}",
                self.watermark_opacity
            ));
        }

        if self.default_code_ttl_hours < 1 {
            return Err(anyhow::anyhow!("DEFAULT_CODE_TTL_HOURS must be positive"));
        }

        if self.smtp_host.is_some() && self.smtp_from.is_none() {
            return Err(anyhow::anyhow!(
                "SMTP_HOST is set but SMTP_FROM is missing"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PortalConfig {
        PortalConfig {
            base: BaseConfig {
                server_port: 8001,
                cors_origins: vec!["*".to_string()],
                jwt_secret: "a-test-secret-that-is-long-enough-123".to_string(),
                jwt_expiry_hours: 24,
                admin_username: "admin".to_string(),
                admin_password: "admin".to_string(),
                environment: "development".to_string(),
                http_concurrency_limit: 100,
            },
            store_backend: StoreBackend::Memory,
            data_file: String::new(),
            uploads_path: "uploads".to_string(),
            max_document_size_bytes: 1024,
            release_workers: 2,
            watermark_opacity: 0.15,
            default_code_ttl_hours: 72,
            smtp_host: None,
            smtp_port: None,
            smtp_user: None,
            smtp_password: None,
            smtp_from: None,
            smtp_tls: true,
        }
    }

    #[test]
    fn test_validate_accepts_sample() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_short_jwt_secret() {
        let mut config = sample();
        config.base.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_heavy_watermark() {
        let mut config = sample();
        config.watermark_opacity = 0.9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_data_file_for_json_backend() {
        let mut config = sample();
        config.store_backend = StoreBackend::JsonFile;
        assert!(config.validate().is_err());
        config.data_file = "data/portal.json".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!("JSON".parse::<StoreBackend>().unwrap(), StoreBackend::JsonFile);
        assert!("postgres".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_production_detection() {
        let mut config = sample();
        config.base.environment = "Production".to_string();
        assert!(Config(Box::new(config)).is_production());
    }
}
