use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccessRequestStatus {
    #[default]
    Pending,
    Processed,
}

/// A visitor asking for a code. An administrator later issues the code by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AccessRequest {
    pub id: Uuid,
    pub parcelle_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parcelle_nom: Option<String>,
    pub client_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,
    #[serde(default)]
    pub status: AccessRequestStatus,
    pub created_at: DateTime<Utc>,
}
