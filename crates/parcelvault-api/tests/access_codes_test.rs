//! Access code issuance, verification and revocation.

mod helpers;

use futures::future::join_all;
use helpers::{api_path, setup_test_app};
use parcelvault_core::CODE_ALPHABET;
use serde_json::{json, Value};
use std::collections::HashSet;

#[tokio::test]
async fn test_create_access_code() {
    let app = setup_test_app().await;

    let body = app
        .create_code(json!({
            "client_name": "Awa Koné",
            "client_email": "awa@example.com",
            "profile_type": "PROSPECT",
            "parcelle_ids": ["tf-223737", "tf-223738", "tf-223737"],
            "expires_hours": 48
        }))
        .await;

    let code = body["code"].as_str().unwrap();
    assert_eq!(code.len(), 8);
    assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
    assert_eq!(body["profile_type"], "PROSPECT");
    assert_eq!(body["parcelle_count"], 2);
}

#[tokio::test]
async fn test_create_access_code_rejects_invalid_input() {
    let app = setup_test_app().await;

    let bad_email = app
        .client()
        .post(&api_path("/admin/access-codes"))
        .add_header("Authorization", app.bearer())
        .json(&json!({ "client_name": "Awa", "client_email": "not-an-email" }))
        .await;
    assert_eq!(bad_email.status_code(), 400);

    let bad_expiry = app
        .client()
        .post(&api_path("/admin/access-codes"))
        .add_header("Authorization", app.bearer())
        .json(&json!({
            "client_name": "Awa",
            "client_email": "awa@example.com",
            "expires_hours": 0
        }))
        .await;
    assert_eq!(bad_expiry.status_code(), 400);
}

#[tokio::test]
async fn test_concurrent_creation_yields_unique_codes() {
    let app = setup_test_app().await;

    let bodies = join_all((0..20).map(|i| {
        app.create_code(json!({
            "client_name": format!("Client {}", i),
            "client_email": format!("client{}@example.com", i),
            "parcelle_ids": ["tf-223740"]
        }))
    }))
    .await;

    let codes: HashSet<String> = bodies
        .iter()
        .map(|b| b["code"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(codes.len(), 20);

    let listed = app
        .client()
        .get(&api_path("/admin/access-codes"))
        .add_header("Authorization", app.bearer())
        .await
        .json::<Value>();
    assert_eq!(listed["access_codes"].as_array().unwrap().len(), 20);
}

#[tokio::test]
async fn test_verify_code_scoped_and_wildcard() {
    let app = setup_test_app().await;
    let scoped = app.issue_code("PROSPECT", &["tf-223737"]).await;
    let wildcard = app.issue_code("PROPRIETAIRE", &[]).await;

    let ok = app
        .client()
        .post(&api_path("/documents/verify-code"))
        .json(&json!({ "code": scoped.to_lowercase(), "parcelle_id": "tf-223737" }))
        .await;
    assert_eq!(ok.status_code(), 200);
    let body = ok.json::<Value>();
    assert_eq!(body["valid"], true);
    assert_eq!(body["is_all_parcelles"], false);

    let out_of_scope = app
        .client()
        .post(&api_path("/documents/verify-code"))
        .json(&json!({ "code": scoped, "parcelle_id": "tf-223741" }))
        .await;
    assert_eq!(out_of_scope.status_code(), 403);

    let any_parcel = app
        .client()
        .post(&api_path("/documents/verify-code"))
        .json(&json!({ "code": wildcard, "parcelle_id": "tf-223741" }))
        .await;
    assert_eq!(any_parcel.status_code(), 200);
    assert_eq!(any_parcel.json::<Value>()["is_all_parcelles"], true);
}

#[tokio::test]
async fn test_verify_code_accepts_form_body() {
    let app = setup_test_app().await;
    let code = app.issue_code("PROSPECT", &["tf-223738"]).await;

    let response = app
        .client()
        .post(&api_path("/documents/verify-code"))
        .form(&[("code", code.as_str())])
        .await;

    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn test_unknown_code_is_denied_without_details() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(&api_path("/documents/verify-code"))
        .json(&json!({ "code": "DJ9MFX7J" }))
        .await;

    assert_eq!(response.status_code(), 403);
    let body = response.json::<Value>();
    assert_eq!(body["code"], "ACCESS_DENIED");
    assert_eq!(body["error"], "Invalid, expired or unauthorized access code");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_revoked_code_is_denied() {
    let app = setup_test_app().await;
    let created = app
        .create_code(json!({
            "client_name": "Awa Koné",
            "client_email": "awa@example.com",
            "parcelle_ids": ["tf-223737"]
        }))
        .await;
    let id = created["id"].as_str().unwrap();
    let code = created["code"].as_str().unwrap();

    let revoked = app
        .client()
        .delete(&api_path(&format!("/admin/access-codes/{}", id)))
        .add_header("Authorization", app.bearer())
        .await;
    assert_eq!(revoked.status_code(), 200);

    let verify = app
        .client()
        .post(&api_path("/documents/verify-code"))
        .json(&json!({ "code": code }))
        .await;
    assert_eq!(verify.status_code(), 403);
    assert_eq!(verify.json::<Value>()["code"], "ACCESS_DENIED");

    let listed = app
        .client()
        .get(&api_path("/admin/access-codes"))
        .add_header("Authorization", app.bearer())
        .await
        .json::<Value>();
    assert_eq!(listed["access_codes"][0]["active"], false);
}

#[tokio::test]
async fn test_revoke_unknown_id_is_not_found() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .delete(&api_path(
            "/admin/access-codes/00000000-0000-0000-0000-000000000000",
        ))
        .add_header("Authorization", app.bearer())
        .await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_verify_profile_reports_permissions() {
    let app = setup_test_app().await;
    let prospect = app.issue_code("PROSPECT", &["tf-223737"]).await;
    let owner = app.issue_code("PROPRIETAIRE", &["tf-223737"]).await;

    let prospect_profile = app
        .client()
        .post(&api_path("/documents/verify-profile"))
        .json(&json!({ "code": prospect, "parcelle_id": "tf-223737" }))
        .await
        .json::<Value>();
    assert_eq!(prospect_profile["show_watermark"], true);
    assert_eq!(prospect_profile["can_access_surveillance"], false);

    let owner_profile = app
        .client()
        .post(&api_path("/documents/verify-profile"))
        .json(&json!({ "code": owner, "parcelle_id": "tf-223737" }))
        .await
        .json::<Value>();
    assert_eq!(owner_profile["show_watermark"], false);
    assert_eq!(owner_profile["profile_type"], "PROPRIETAIRE");
}

#[tokio::test]
async fn test_verify_profile_wildcard_code_unknown_parcel_is_not_found() {
    let app = setup_test_app().await;
    let code = app.issue_code("PROSPECT", &[]).await;

    let response = app
        .client()
        .post(&api_path("/documents/verify-profile"))
        .json(&json!({ "code": code, "parcelle_id": "tf-999999" }))
        .await;
    assert_eq!(response.status_code(), 404);
    assert_eq!(response.json::<Value>()["code"], "PARCEL_NOT_FOUND");

    let known = app
        .client()
        .post(&api_path("/documents/verify-profile"))
        .json(&json!({ "code": code, "parcelle_id": "tf-223741" }))
        .await;
    assert_eq!(known.status_code(), 200);
}

#[tokio::test]
async fn test_owner_parcelles() {
    let app = setup_test_app().await;
    let code = app
        .issue_code("PROPRIETAIRE", &["tf-223737", "tf-223740", "tf-missing"])
        .await;

    let response = app
        .client()
        .post(&api_path("/documents/get-owner-parcelles"))
        .json(&json!({ "code": code }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body = response.json::<Value>();
    assert_eq!(body["parcelle_count"], 2);
    assert_eq!(body["is_multi_parcelle"], true);
}
