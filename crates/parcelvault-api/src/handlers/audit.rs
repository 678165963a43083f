//! Admin reads over the download audit log.

use crate::auth::models::AdminContext;
use crate::constants::REALTIME_FEED_LIMIT;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use parcelvault_core::models::{ActivityNotifications, DownloadLogEntry, DownloadStats};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

const MAX_FEED_LIMIT: usize = 500;

#[derive(Debug, Deserialize, IntoParams)]
pub struct SinceQuery {
    /// Only entries strictly newer than this RFC 3339 timestamp.
    pub since: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct FeedQuery {
    #[serde(default = "default_feed_limit")]
    pub limit: usize,
}

fn default_feed_limit() -> usize {
    REALTIME_FEED_LIMIT
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DownloadLogsResponse {
    pub logs: Vec<DownloadLogEntry>,
}

#[utoipa::path(
    get,
    path = "/api/admin/download-logs",
    tag = "audit",
    params(SinceQuery),
    responses(
        (status = 200, description = "Audit entries, newest first", body = DownloadLogsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn download_logs(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    Query(query): Query<SinceQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let logs = state.db.download_logs.list(query.since).await?;
    Ok(Json(DownloadLogsResponse { logs }))
}

#[utoipa::path(
    get,
    path = "/api/admin/download-logs/stats",
    tag = "audit",
    responses(
        (status = 200, description = "Counts by client and by parcel", body = DownloadStats),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn download_stats(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.db.download_logs.stats().await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/notifications",
    tag = "audit",
    params(SinceQuery),
    responses(
        (status = 200, description = "Activity since the caller last polled", body = ActivityNotifications),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn notifications(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    Query(query): Query<SinceQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let notifications = state
        .db
        .download_logs
        .recent_notifications(REALTIME_FEED_LIMIT, query.since, Utc::now())
        .await?;
    Ok(Json(notifications))
}

#[utoipa::path(
    get,
    path = "/api/admin/access-logs/realtime",
    tag = "audit",
    params(FeedQuery),
    responses(
        (status = 200, description = "Most recent entries", body = DownloadLogsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn realtime_access_logs(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    Query(query): Query<FeedQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let limit = query.limit.clamp(1, MAX_FEED_LIMIT);
    let logs = state.db.download_logs.recent(limit).await?;
    Ok(Json(DownloadLogsResponse { logs }))
}
