use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One successful document release. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DownloadLogEntry {
    pub id: Uuid,
    pub code: String,
    pub client_name: String,
    pub parcelle_id: String,
    pub document_type: String,
    pub document_label: String,
    pub timestamp: DateTime<Utc>,
}

impl DownloadLogEntry {
    pub fn new(
        code: impl Into<String>,
        client_name: impl Into<String>,
        parcelle_id: impl Into<String>,
        document_type: impl Into<String>,
        document_label: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: code.into(),
            client_name: client_name.into(),
            parcelle_id: parcelle_id.into(),
            document_type: document_type.into(),
            document_label: document_label.into(),
            timestamp,
        }
    }
}

/// Counts grouped by client and by parcel over the whole log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DownloadStats {
    pub total_downloads: usize,
    pub by_client: BTreeMap<String, usize>,
    pub by_parcelle: BTreeMap<String, usize>,
}

/// Polling payload for the admin activity badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ActivityNotifications {
    /// Entries strictly newer than the caller's `since`.
    pub new_count: usize,
    /// Entries in the 24 hours before the request.
    pub last_24h: usize,
    pub logs: Vec<DownloadLogEntry>,
    pub latest_timestamp: Option<DateTime<Utc>>,
}
