//! Catalog administration, official document uploads, code requests and the audit feed.

mod helpers;

use helpers::fixtures::sample_pdf;
use helpers::{api_path, setup_test_app};
use serde_json::{json, Value};

#[tokio::test]
async fn test_upload_then_list_and_delete_document() {
    let app = setup_test_app().await;

    let uploaded = app
        .upload_document("tf-223737", "titre_foncier", sample_pdf("TF 223737"))
        .await;
    let key = uploaded["filename"].as_str().unwrap().to_string();
    assert_eq!(uploaded["document"]["type"], "titre_foncier");
    assert_eq!(uploaded["document"]["original_name"], "titre.pdf");

    let listing = app
        .client()
        .get(&api_path("/parcelles/tf-223737/documents"))
        .await
        .json::<Value>();
    let available = listing["available_documents"].as_array().unwrap();
    assert!(available
        .iter()
        .any(|d| d["type"] == "titre_foncier" && d["uploaded"] == true));
    assert!(available
        .iter()
        .any(|d| d["type"] == "plan" && d["uploaded"] == false));

    let deleted = app
        .client()
        .delete(&api_path("/admin/document/tf-223737/titre_foncier"))
        .add_header("Authorization", app.bearer())
        .await;
    assert_eq!(deleted.status_code(), 200);
    assert_eq!(deleted.json::<Value>()["removed"], 1);
    assert!(!app.state.documents.storage.exists(&key).await.unwrap());

    let again = app
        .client()
        .delete(&api_path("/admin/document/tf-223737/titre_foncier"))
        .add_header("Authorization", app.bearer())
        .await;
    assert_eq!(again.status_code(), 404);
}

#[tokio::test]
async fn test_upload_rejects_non_pdf() {
    let app = setup_test_app().await;

    let form = axum_test::multipart::MultipartForm::new()
        .add_text("document_type", "acd")
        .add_part(
            "file",
            axum_test::multipart::Part::bytes(b"GIF89a not a pdf".to_vec())
                .file_name("acd.pdf")
                .mime_type("application/pdf"),
        );
    let response = app
        .client()
        .post(&api_path("/admin/upload/document/tf-223738"))
        .add_header("Authorization", app.bearer())
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_upload_to_unknown_parcel() {
    let app = setup_test_app().await;

    let form = axum_test::multipart::MultipartForm::new()
        .add_text("document_type", "acd")
        .add_part(
            "file",
            axum_test::multipart::Part::bytes(sample_pdf("ACD"))
                .file_name("acd.pdf")
                .mime_type("application/pdf"),
        );
    let response = app
        .client()
        .post(&api_path("/admin/upload/document/tf-000000"))
        .add_header("Authorization", app.bearer())
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_import_and_update_status() {
    let app = setup_test_app().await;

    let imported = app
        .client()
        .post(&api_path("/admin/parcelles/import"))
        .add_header("Authorization", app.bearer())
        .json(&json!([
            { "id": "tf-223737", "nom": "Lot 37 bis" },
            { "id": "tf-300001", "nom": "Lot 1", "superficie": 2.5 }
        ]))
        .await;
    assert_eq!(imported.status_code(), 200);
    let body = imported.json::<Value>();
    assert_eq!(body["imported"], 1);
    assert_eq!(body["total"], 5);

    let updated = app
        .client()
        .patch(&api_path("/admin/parcelles/tf-300001/status"))
        .add_header("Authorization", app.bearer())
        .json(&json!({ "statut": "vendu" }))
        .await;
    assert_eq!(updated.status_code(), 200);
    assert_eq!(updated.json::<Value>()["statut"], "vendu");

    let invalid = app
        .client()
        .patch(&api_path("/admin/parcelles/tf-300001/status"))
        .add_header("Authorization", app.bearer())
        .json(&json!({ "statut": "reserve" }))
        .await;
    assert_eq!(invalid.status_code(), 400);

    let stats = app.client().get(&api_path("/stats")).await.json::<Value>();
    assert_eq!(stats["total"], 5);
    assert_eq!(stats["vendu"], 1);
}

#[tokio::test]
async fn test_code_requests_queue() {
    let app = setup_test_app().await;

    let created = app
        .client()
        .post(&api_path("/code-requests"))
        .json(&json!({
            "nom": "Koné",
            "prenom": "Awa",
            "whatsapp": "+2250700000000",
            "parcelle_id": "tf-223737",
            "parcelle_nom": "Lot 37"
        }))
        .await;
    assert_eq!(created.status_code(), 201);
    assert_eq!(created.json::<Value>()["request"]["client_name"], "Awa Koné");

    let invalid = app
        .client()
        .post(&api_path("/code-requests"))
        .json(&json!({
            "nom": "Koné",
            "prenom": "Awa",
            "whatsapp": "1",
            "parcelle_id": "tf-223737"
        }))
        .await;
    assert_eq!(invalid.status_code(), 400);

    let listed = app
        .client()
        .get(&api_path("/admin/code-requests"))
        .add_header("Authorization", app.bearer())
        .await
        .json::<Value>();
    assert_eq!(listed["requests"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_audit_stats_and_feed() {
    let app = setup_test_app().await;
    let first = app.issue_code("PROSPECT", &["tf-223737"]).await;
    let second = app.issue_code("PROPRIETAIRE", &[]).await;

    for (code, parcel) in [
        (&first, "tf-223737"),
        (&second, "tf-223737"),
        (&second, "tf-223741"),
    ] {
        let response = app
            .client()
            .get(&api_path(&format!("/documents/{}/plan", parcel)))
            .add_query_param("code", code)
            .await;
        assert_eq!(response.status_code(), 200);
    }

    let stats = app
        .client()
        .get(&api_path("/admin/download-logs/stats"))
        .add_header("Authorization", app.bearer())
        .await
        .json::<Value>();
    assert_eq!(stats["total_downloads"], 3);
    assert_eq!(stats["by_parcelle"]["tf-223737"], 2);

    let feed = app
        .client()
        .get(&api_path("/admin/access-logs/realtime"))
        .add_query_param("limit", 2)
        .add_header("Authorization", app.bearer())
        .await
        .json::<Value>();
    let logs = feed["logs"].as_array().unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["parcelle_id"], "tf-223741");

    let notifications = app
        .client()
        .get(&api_path("/admin/notifications"))
        .add_header("Authorization", app.bearer())
        .await
        .json::<Value>();
    assert_eq!(notifications["last_24h"], 3);
    assert!(notifications["latest_timestamp"].is_string());
}
