use async_trait::async_trait;
use parcelvault_api::{Mailer, OutgoingDocument};
use parcelvault_core::AppError;
use std::sync::Mutex;

/// Records every message instead of talking SMTP.
#[derive(Default)]
pub struct CapturingMailer {
    pub sent: Mutex<Vec<OutgoingDocument>>,
}

impl CapturingMailer {
    pub fn sent(&self) -> Vec<OutgoingDocument> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send_document(&self, message: OutgoingDocument) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}
