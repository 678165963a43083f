//! Admin authentication integration tests.
//!
//! Run with: `cargo test -p parcelvault-api --test auth_test`

mod helpers;

use helpers::{api_path, setup_test_app, ADMIN_USERNAME};
use serde_json::{json, Value};

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(&api_path("/auth/login"))
        .json(&json!({ "username": ADMIN_USERNAME, "password": "nope" }))
        .await;

    assert_eq!(response.status_code(), 401);
    assert_eq!(response.json::<Value>()["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_verify_token() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get(&api_path("/auth/verify"))
        .add_header("Authorization", app.bearer())
        .await;

    assert_eq!(response.status_code(), 200);
    let body = response.json::<Value>();
    assert_eq!(body["valid"], true);
    assert_eq!(body["username"], ADMIN_USERNAME);
}

#[tokio::test]
async fn test_admin_routes_require_bearer() {
    let app = setup_test_app().await;

    let missing = app.client().get(&api_path("/admin/access-codes")).await;
    assert_eq!(missing.status_code(), 401);

    let forged = app
        .client()
        .get(&api_path("/admin/download-logs"))
        .add_header("Authorization", "Bearer not-a-real-token")
        .await;
    assert_eq!(forged.status_code(), 401);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = setup_test_app().await;

    let response = app.client().get(&api_path("/admin/does-not-exist")).await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_public_catalog_needs_no_token() {
    let app = setup_test_app().await;

    let response = app.client().get(&api_path("/parcelles")).await;

    assert_eq!(response.status_code(), 200);
    let body = response.json::<Value>();
    assert_eq!(body["parcelles"].as_array().map(Vec::len), Some(4));
}

#[tokio::test]
async fn test_health_and_openapi() {
    let app = setup_test_app().await;

    let health = app.client().get("/api/health").await;
    assert_eq!(health.status_code(), 200);
    let body = health.json::<Value>();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["email"], "not_configured");

    let spec = app.client().get("/api/openapi.json").await;
    assert_eq!(spec.status_code(), 200);
    assert!(spec.json::<Value>()["paths"]["/api/documents/verify-code"].is_object());
}
