//! Email delivery of released documents via SMTP.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use tracing::info;

use parcelvault_core::{AppError, Config};

/// A released PDF going to one recipient.
#[derive(Debug, Clone)]
pub struct OutgoingDocument {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub filename: String,
    pub pdf: Vec<u8>,
}

pub fn document_subject(parcel_name: &str) -> String {
    format!(
        "Vos documents officiels - Parcelle {} - Songon Extension",
        parcel_name
    )
}

pub fn document_body(client_name: &str, label: &str, parcel_name: &str) -> String {
    format!(
        "Bonjour {},\n\nVeuillez trouver ci-joint le document « {} » de la parcelle {}.\n\nCordialement,\nL'équipe Songon Extension",
        client_name, label, parcel_name
    )
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_document(&self, message: OutgoingDocument) -> Result<(), AppError>;
}

/// SMTP mailer. Absent when SMTP is not configured.
#[derive(Clone)]
pub struct EmailService {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
}

impl EmailService {
    /// Create email service from config. Returns `None` if SMTP is not configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        let Some(host) = config.smtp_host() else {
            tracing::debug!("Email delivery disabled (SMTP_HOST not set)");
            return None;
        };
        let from = config.smtp_from()?.to_string();
        let port = config.smtp_port().unwrap_or(587);
        let credentials = match (config.smtp_user(), config.smtp_password()) {
            (Some(u), Some(p)) => Some(Credentials::new(u.to_string(), p.to_string())),
            _ => None,
        };

        let mailer = if config.smtp_tls() {
            let b = match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host) {
                Ok(b) => b.port(port),
                Err(e) => {
                    tracing::error!(host = %host, error = %e, "Invalid SMTP relay, email delivery disabled");
                    return None;
                }
            };
            let b = match credentials {
                Some(c) => b.credentials(c),
                None => b,
            };
            tracing::info!(host = %host, port = port, "Email service initialized (SMTP with STARTTLS)");
            b.build()
        } else {
            let b = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port);
            let b = match credentials {
                Some(c) => b.credentials(c),
                None => b,
            };
            tracing::info!(host = %host, port = port, "Email service initialized (SMTP)");
            b.build()
        };

        Some(Self {
            mailer: Arc::new(mailer),
            from,
        })
    }

    fn build(&self, message: OutgoingDocument) -> Result<Message, AppError> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|_| AppError::InvalidInput(format!("Invalid email address: {}", message.to)))?;
        let from: Mailbox = self
            .from
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid SMTP_FROM: {}", e)))?;
        let pdf_type = ContentType::parse("application/pdf")
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject)
            .multipart(
                MultiPart::mixed()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(message.body),
                    )
                    .singlepart(Attachment::new(message.filename).body(message.pdf, pdf_type)),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))
    }
}

#[async_trait]
impl Mailer for EmailService {
    async fn send_document(&self, message: OutgoingDocument) -> Result<(), AppError> {
        let filename = message.filename.clone();
        let email = self.build(message)?;
        self.mailer.send(email).await.map_err(|e| {
            tracing::error!(error = %e, "SMTP send failed");
            AppError::ServiceUnavailable("Email delivery failed".to_string())
        })?;
        info!(filename = %filename, "Document email sent");
        Ok(())
    }
}
