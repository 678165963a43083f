//! Test helpers: build AppState and router for integration tests.
//!
//! Everything runs in-process: an in-memory data store, document storage in a
//! temporary directory, and the mock transport of `axum-test`.

#![allow(dead_code)]

pub mod fixtures;
pub mod mailer;

use axum_test::TestServer;
use parcelvault_api::constants;
use parcelvault_api::setup::{routes, services::build_state};
use parcelvault_api::state::AppState;
use parcelvault_api::Mailer;
use parcelvault_core::models::Parcel;
use parcelvault_core::{BaseConfig, Config, PortalConfig, StoreBackend};
use parcelvault_db::{InMemoryStore, Store};
use parcelvault_storage::{LocalStorage, Storage};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "test-admin-password";

/// Parcels every test app starts with.
pub const SEEDED_PARCELS: [(&str, &str); 4] = [
    ("tf-223737", "Lot 37"),
    ("tf-223738", "Lot 38"),
    ("tf-223740", "Lot 40"),
    ("tf-223741", "Lot 41"),
];

/// API path prefix for tests (e.g. `/api`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server, state, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub admin_token: String,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.admin_token)
    }

    /// Issue a code through the admin API and return the response body.
    pub async fn create_code(&self, body: Value) -> Value {
        let response = self
            .server
            .post(&api_path("/admin/access-codes"))
            .add_header("Authorization", self.bearer())
            .json(&body)
            .await;
        assert_eq!(response.status_code(), 201, "{}", response.text());
        response.json::<Value>()
    }

    /// Issue a code for `parcels` and return only the code string.
    pub async fn issue_code(&self, profile_type: &str, parcels: &[&str]) -> String {
        let body = self
            .create_code(json!({
                "client_name": "Awa Koné",
                "client_email": "awa@example.com",
                "profile_type": profile_type,
                "parcelle_ids": parcels,
                "expires_hours": 72
            }))
            .await;
        body["code"].as_str().expect("code in response").to_string()
    }

    /// Upload a PDF as an official document through the admin API.
    pub async fn upload_document(&self, parcel_id: &str, document_type: &str, pdf: Vec<u8>) -> Value {
        let form = axum_test::multipart::MultipartForm::new()
            .add_text("document_type", document_type)
            .add_part(
                "file",
                axum_test::multipart::Part::bytes(pdf)
                    .file_name("titre.pdf")
                    .mime_type("application/pdf"),
            );
        let response = self
            .server
            .post(&api_path(&format!("/admin/upload/document/{}", parcel_id)))
            .add_header("Authorization", self.bearer())
            .multipart(form)
            .await;
        assert_eq!(response.status_code(), 201, "{}", response.text());
        response.json::<Value>()
    }
}

pub fn test_config(uploads_path: &str) -> Config {
    Config(Box::new(PortalConfig {
        base: BaseConfig {
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            jwt_secret: "integration-test-secret-at-least-32-chars".to_string(),
            jwt_expiry_hours: 1,
            admin_username: ADMIN_USERNAME.to_string(),
            admin_password: ADMIN_PASSWORD.to_string(),
            environment: "test".to_string(),
            http_concurrency_limit: 64,
        },
        store_backend: StoreBackend::Memory,
        data_file: String::new(),
        uploads_path: uploads_path.to_string(),
        max_document_size_bytes: 5 * 1024 * 1024,
        release_workers: 2,
        watermark_opacity: 0.15,
        default_code_ttl_hours: 72,
        smtp_host: None,
        smtp_port: None,
        smtp_user: None,
        smtp_password: None,
        smtp_from: None,
        smtp_tls: false,
    }))
}

/// Setup test app without an email transport.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with_mailer(None).await
}

/// Setup test app with isolated store and local storage.
pub async fn setup_test_app_with_mailer(mailer: Option<Arc<dyn Mailer>>) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let uploads = temp_dir.path().to_string_lossy().to_string();
    let config = test_config(&uploads);

    let store = Arc::new(
        Store::open(Arc::new(InMemoryStore::new()))
            .await
            .expect("Failed to open in-memory store"),
    );
    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(temp_dir.path())
            .await
            .expect("Failed to create local storage"),
    );

    let state = build_state(&config, store, storage, mailer);
    state
        .db
        .parcels
        .import(
            SEEDED_PARCELS
                .iter()
                .map(|(id, nom)| Parcel::with_defaults(*id, *nom, vec![[-4.25, 5.35]]))
                .collect(),
        )
        .await
        .expect("Failed to seed parcels");

    let router = routes::setup_routes(&config, state.clone()).expect("Failed to build routes");
    let server = TestServer::new(router).expect("Failed to start test server");

    let login = server
        .post(&api_path("/auth/login"))
        .json(&json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }))
        .await;
    assert_eq!(login.status_code(), 200);
    let admin_token = login.json::<Value>()["token"]
        .as_str()
        .expect("token in login response")
        .to_string();

    TestApp {
        server,
        state,
        admin_token,
        _temp_dir: temp_dir,
    }
}
