use std::sync::Arc;

use parcelvault_core::models::AccessRequest;
use parcelvault_core::AppError;

use crate::store::Store;

/// Queue of visitors asking for an access code
#[derive(Clone)]
pub struct AccessRequestRepository {
    store: Arc<Store>,
}

impl AccessRequestRepository {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, request), fields(db.table = "code_requests", db.operation = "insert"))]
    pub async fn create(&self, request: AccessRequest) -> Result<AccessRequest, AppError> {
        self.store
            .write(|snap| {
                snap.code_requests.push(request.clone());
                Ok(request.clone())
            })
            .await
    }

    /// Newest first.
    pub async fn list(&self) -> Result<Vec<AccessRequest>, AppError> {
        let snap = self.store.read().await;
        Ok(snap.code_requests.iter().rev().cloned().collect())
    }
}
