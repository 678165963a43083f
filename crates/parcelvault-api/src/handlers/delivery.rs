//! Delivery of a released document to a recipient chosen by the code holder.

use crate::error::{ErrorResponse, FormOrJson, HttpAppError};
use crate::services::email::{document_body, document_subject};
use crate::services::{whatsapp, OutgoingDocument};
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use parcelvault_core::{AppError, Decision};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    Email,
    Whatsapp,
}

impl fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryMethod::Email => f.write_str("email"),
            DeliveryMethod::Whatsapp => f.write_str("whatsapp"),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendDocumentRequest {
    pub code: String,
    pub parcelle_id: String,
    pub document_type: String,
    pub method: DeliveryMethod,
    /// Email address or phone number, depending on `method`.
    pub recipient: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendEmailRequest {
    pub code: String,
    pub parcelle_id: String,
    pub document_type: String,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SendDocumentResponse {
    pub success: bool,
    pub method: DeliveryMethod,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp_url: Option<String>,
}

/// Audit tag for a delivered document.
pub fn delivery_audit_type(document_type: &str, method: DeliveryMethod) -> String {
    format!("{}_sent_via_{}", document_type, method)
}

/// Absolute link to the document when the request carried a Host header.
fn document_url(headers: &HeaderMap, decision: &Decision, document_type: &str) -> String {
    let path = format!(
        "/api/documents/{}/{}?code={}&action=download",
        urlencoding::encode(&decision.parcel_id),
        urlencoding::encode(document_type),
        urlencoding::encode(&decision.code)
    );
    let host = headers.get(header::HOST).and_then(|h| h.to_str().ok());
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("http");
    match host {
        Some(host) => format!("{}://{}{}", scheme, host, path),
        None => path,
    }
}

async fn deliver(
    state: &AppState,
    headers: &HeaderMap,
    request: SendDocumentRequest,
) -> Result<SendDocumentResponse, HttpAppError> {
    let services = &state.services;
    let decision = services
        .policy
        .evaluate(request.code.trim(), request.parcelle_id.trim())
        .await?;
    let recipient = request.recipient.trim();

    let response = match request.method {
        DeliveryMethod::Email => {
            let mailer = services.mailer.clone().ok_or_else(|| {
                AppError::ServiceUnavailable("Email delivery is not configured".to_string())
            })?;
            let document = services
                .release
                .release(&decision, &request.document_type)
                .await?;
            mailer
                .send_document(OutgoingDocument {
                    to: recipient.to_string(),
                    subject: document_subject(&document.parcel_name),
                    body: document_body(
                        &decision.client_name,
                        &document.label,
                        &document.parcel_name,
                    ),
                    filename: document.filename.clone(),
                    pdf: document.bytes,
                })
                .await?;
            services
                .release
                .record(
                    &decision,
                    &delivery_audit_type(&document.document_type, DeliveryMethod::Email),
                    &document.label,
                )
                .await?;
            SendDocumentResponse {
                success: true,
                method: DeliveryMethod::Email,
                message: format!("Document envoyé à {}", recipient),
                whatsapp_url: None,
            }
        }
        DeliveryMethod::Whatsapp => {
            let info = services
                .release
                .describe(&decision, &request.document_type)
                .await?;
            let parcel_name = state
                .db
                .parcels
                .get(&decision.parcel_id)
                .await?
                .map(|p| p.nom)
                .unwrap_or_else(|| decision.parcel_id.clone());
            let message = whatsapp::share_message(
                &decision.client_name,
                &info.label,
                &parcel_name,
                &document_url(headers, &decision, &info.document_type),
            );
            let url = whatsapp::share_link(recipient, &message)?;
            services
                .release
                .record(
                    &decision,
                    &delivery_audit_type(&info.document_type, DeliveryMethod::Whatsapp),
                    &info.label,
                )
                .await?;
            SendDocumentResponse {
                success: true,
                method: DeliveryMethod::Whatsapp,
                message: "Lien WhatsApp généré".to_string(),
                whatsapp_url: Some(url),
            }
        }
    };

    tracing::info!(
        parcel_id = %decision.parcel_id,
        document_type = %request.document_type,
        method = %request.method,
        "Document delivered"
    );
    Ok(response)
}

#[utoipa::path(
    post,
    path = "/api/documents/send",
    tag = "documents",
    request_body = SendDocumentRequest,
    responses(
        (status = 200, description = "Document emailed, or WhatsApp link returned", body = SendDocumentResponse),
        (status = 400, description = "Invalid recipient", body = ErrorResponse),
        (status = 403, description = "Invalid, expired or unauthorized access code", body = ErrorResponse),
        (status = 503, description = "Email delivery not configured", body = ErrorResponse)
    )
)]
pub async fn send_document(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    FormOrJson(request): FormOrJson<SendDocumentRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(deliver(&state, &headers, request).await?))
}

#[utoipa::path(
    post,
    path = "/api/documents/send-email",
    tag = "documents",
    request_body = SendEmailRequest,
    responses(
        (status = 200, description = "Document emailed", body = SendDocumentResponse),
        (status = 403, description = "Invalid, expired or unauthorized access code", body = ErrorResponse),
        (status = 503, description = "Email delivery not configured", body = ErrorResponse)
    )
)]
pub async fn send_email(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    FormOrJson(request): FormOrJson<SendEmailRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let request = SendDocumentRequest {
        code: request.code,
        parcelle_id: request.parcelle_id,
        document_type: request.document_type,
        method: DeliveryMethod::Email,
        recipient: request.email,
    };
    Ok(Json(deliver(&state, &headers, request).await?))
}
