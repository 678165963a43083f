use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parcelvault_core::models::{ActivityNotifications, DownloadLogEntry, DownloadStats};
use parcelvault_core::AppError;

use crate::store::Store;

/// Append-only audit trail of released documents
#[derive(Clone)]
pub struct DownloadLogRepository {
    store: Arc<Store>,
}

impl DownloadLogRepository {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, entry), fields(db.table = "download_logs", db.operation = "insert"))]
    pub async fn append(&self, entry: DownloadLogEntry) -> Result<(), AppError> {
        self.store
            .write(|snap| {
                snap.download_logs.push(entry.clone());
                Ok(())
            })
            .await
    }

    /// Entries newest first, optionally only those strictly after `since`.
    pub async fn list(&self, since: Option<DateTime<Utc>>) -> Result<Vec<DownloadLogEntry>, AppError> {
        let snap = self.store.read().await;
        Ok(newest_first(&snap.download_logs)
            .filter(|e| since.is_none_or(|s| e.timestamp > s))
            .cloned()
            .collect())
    }

    pub async fn recent(&self, limit: usize) -> Result<Vec<DownloadLogEntry>, AppError> {
        let snap = self.store.read().await;
        Ok(newest_first(&snap.download_logs).take(limit).cloned().collect())
    }

    pub async fn stats(&self) -> Result<DownloadStats, AppError> {
        let snap = self.store.read().await;
        Ok(aggregate(&snap.download_logs))
    }

    pub async fn stats_by_client(&self) -> Result<BTreeMap<String, usize>, AppError> {
        Ok(self.stats().await?.by_client)
    }

    pub async fn stats_by_parcel(&self) -> Result<BTreeMap<String, usize>, AppError> {
        Ok(self.stats().await?.by_parcelle)
    }

    /// Activity badge payload: entries strictly newer than `since` (the latest
    /// `limit` when the caller has seen nothing yet), plus a rolling 24-hour count.
    pub async fn recent_notifications(
        &self,
        limit: usize,
        since: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<ActivityNotifications, AppError> {
        let snap = self.store.read().await;
        let logs = &snap.download_logs;
        let day_ago = now - Duration::hours(24);
        let unseen: Vec<DownloadLogEntry> = newest_first(logs)
            .filter(|e| since.is_none_or(|s| e.timestamp > s))
            .cloned()
            .collect();

        Ok(ActivityNotifications {
            new_count: if since.is_some() { unseen.len() } else { 0 },
            last_24h: logs.iter().filter(|e| e.timestamp > day_ago).count(),
            logs: unseen.into_iter().take(limit).collect(),
            latest_timestamp: logs.iter().map(|e| e.timestamp).max(),
        })
    }
}

/// Descending by timestamp. Concurrent releases may append slightly out of
/// order; ties keep the later append first.
fn newest_first(entries: &[DownloadLogEntry]) -> impl Iterator<Item = &DownloadLogEntry> {
    let mut sorted: Vec<&DownloadLogEntry> = entries.iter().rev().collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    sorted.into_iter()
}

fn aggregate(entries: &[DownloadLogEntry]) -> DownloadStats {
    let mut stats = DownloadStats {
        total_downloads: entries.len(),
        ..Default::default()
    };
    for entry in entries {
        *stats.by_client.entry(entry.client_name.clone()).or_default() += 1;
        *stats.by_parcelle.entry(entry.parcelle_id.clone()).or_default() += 1;
    }
    stats
}
