use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Who the code was issued to, which drives the permission table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProfileType {
    /// Prospective buyer: watermarked documents, no surveillance feed.
    #[default]
    Prospect,
    /// Owner: clean documents, surveillance feed when a camera is configured.
    Proprietaire,
}

impl fmt::Display for ProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileType::Prospect => write!(f, "PROSPECT"),
            ProfileType::Proprietaire => write!(f, "PROPRIETAIRE"),
        }
    }
}

impl FromStr for ProfileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PROSPECT" => Ok(ProfileType::Prospect),
            "PROPRIETAIRE" => Ok(ProfileType::Proprietaire),
            other => Err(format!("Unknown profile type: {}", other)),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Per-parcel surveillance override carried by owner codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ParcelConfig {
    #[serde(default = "default_true")]
    pub camera_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

impl ParcelConfig {
    /// The feed URL, if the camera is on and a non-blank URL is configured.
    pub fn active_video_url(&self) -> Option<&str> {
        if !self.camera_enabled {
            return None;
        }
        self.video_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// A stored access grant.
///
/// Never hard-deleted: revocation flips `active` so the audit trail keeps pointing
/// at a real record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccessCode {
    pub id: Uuid,
    pub code: String,
    pub client_name: String,
    #[serde(default)]
    pub client_email: String,
    #[serde(default)]
    pub profile_type: ProfileType,
    /// Empty means every parcel in the catalog.
    #[serde(default)]
    pub parcelle_ids: Vec<String>,
    #[serde(default)]
    pub parcelle_configs: BTreeMap<String, ParcelConfig>,
    #[serde(default)]
    pub camera_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    pub expires_at: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub usage_count: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,
}

impl AccessCode {
    /// Codes are unusable at or after `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_wildcard_scope(&self) -> bool {
        self.parcelle_ids.is_empty()
    }

    pub fn covers_parcel(&self, parcel_id: &str) -> bool {
        self.is_wildcard_scope() || self.parcelle_ids.iter().any(|id| id == parcel_id)
    }

    /// Per-parcel override if one exists, else the code-level camera settings.
    pub fn resolve_parcel_config(&self, parcel_id: &str) -> ParcelConfig {
        self.parcelle_configs
            .get(parcel_id)
            .cloned()
            .unwrap_or_else(|| ParcelConfig {
                camera_enabled: self.camera_enabled,
                video_url: self.video_url.clone(),
            })
    }
}

/// Everything an administrator supplies when issuing a code.
#[derive(Debug, Clone)]
pub struct AccessGrant {
    pub client_name: String,
    pub client_email: String,
    pub profile_type: ProfileType,
    pub parcelle_ids: Vec<String>,
    pub parcelle_configs: BTreeMap<String, ParcelConfig>,
    pub camera_enabled: bool,
    pub video_url: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl AccessGrant {
    /// Fill in owner surveillance settings the way the admin form expects: a single
    /// camera URL given at code level applies to every listed parcel unless explicit
    /// per-parcel configs were supplied. Prospects never carry camera settings.
    pub fn normalized(mut self) -> Self {
        let mut seen = std::collections::HashSet::new();
        self.parcelle_ids = self
            .parcelle_ids
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty() && seen.insert(id.clone()))
            .collect();
        self.video_url = self
            .video_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        match self.profile_type {
            ProfileType::Prospect => {
                self.camera_enabled = false;
                self.video_url = None;
                self.parcelle_configs.clear();
            }
            ProfileType::Proprietaire => {
                if self.parcelle_configs.is_empty() && self.camera_enabled {
                    if let Some(url) = &self.video_url {
                        for id in &self.parcelle_ids {
                            self.parcelle_configs.insert(
                                id.clone(),
                                ParcelConfig {
                                    camera_enabled: true,
                                    video_url: Some(url.clone()),
                                },
                            );
                        }
                    }
                }
                if !self.camera_enabled {
                    self.video_url = None;
                }
            }
        }
        self
    }

    pub fn into_access_code(self, code: String, now: DateTime<Utc>) -> AccessCode {
        AccessCode {
            id: Uuid::new_v4(),
            code,
            client_name: self.client_name,
            client_email: self.client_email,
            profile_type: self.profile_type,
            parcelle_ids: self.parcelle_ids,
            parcelle_configs: self.parcelle_configs,
            camera_enabled: self.camera_enabled,
            video_url: self.video_url,
            expires_at: self.expires_at,
            active: true,
            usage_count: 0,
            created_at: now,
            revoked_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn owner_grant() -> AccessGrant {
        AccessGrant {
            client_name: "Jean Dupont".to_string(),
            client_email: "jean@example.com".to_string(),
            profile_type: ProfileType::Proprietaire,
            parcelle_ids: vec![
                "tf-223737".to_string(),
                " tf-223738 ".to_string(),
                "tf-223737".to_string(),
            ],
            parcelle_configs: BTreeMap::new(),
            camera_enabled: true,
            video_url: Some("https://cam.example.com/live".to_string()),
            expires_at: Utc::now() + Duration::hours(72),
        }
    }

    #[test]
    fn test_profile_type_serde_is_uppercase() {
        assert_eq!(
            serde_json::to_string(&ProfileType::Proprietaire).unwrap(),
            "\"PROPRIETAIRE\""
        );
        let parsed: ProfileType = serde_json::from_str("\"PROSPECT\"").unwrap();
        assert_eq!(parsed, ProfileType::Prospect);
        assert_eq!("proprietaire".parse::<ProfileType>().unwrap(), ProfileType::Proprietaire);
        assert!("ADMIN".parse::<ProfileType>().is_err());
    }

    #[test]
    fn test_normalized_owner_grant_expands_camera_per_parcel() {
        let grant = owner_grant().normalized();
        assert_eq!(grant.parcelle_ids, vec!["tf-223737", "tf-223738"]);
        assert_eq!(grant.parcelle_configs.len(), 2);
        assert_eq!(
            grant.parcelle_configs["tf-223738"].active_video_url(),
            Some("https://cam.example.com/live")
        );
    }

    #[test]
    fn test_explicit_parcel_configs_win() {
        let mut grant = owner_grant();
        grant.parcelle_configs.insert(
            "tf-223737".to_string(),
            ParcelConfig {
                camera_enabled: false,
                video_url: None,
            },
        );
        let grant = grant.normalized();
        assert_eq!(grant.parcelle_configs.len(), 1);
        assert!(!grant.parcelle_configs["tf-223737"].camera_enabled);
    }

    #[test]
    fn test_prospect_grant_drops_camera_settings() {
        let mut grant = owner_grant();
        grant.profile_type = ProfileType::Prospect;
        let grant = grant.normalized();
        assert!(!grant.camera_enabled);
        assert!(grant.video_url.is_none());
        assert!(grant.parcelle_configs.is_empty());
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let now = Utc::now();
        let mut grant = owner_grant();
        grant.expires_at = now;
        let code = grant.into_access_code("ABCDEFGH".to_string(), now);
        assert!(code.is_expired_at(now));
        assert!(!code.is_expired_at(now - Duration::seconds(1)));
    }

    #[test]
    fn test_scope_and_config_resolution() {
        let now = Utc::now();
        let code = owner_grant()
            .normalized()
            .into_access_code("DJ9MFX7J".to_string(), now);
        assert!(code.covers_parcel("tf-223737"));
        assert!(!code.covers_parcel("tf-223741"));
        let fallback = code.resolve_parcel_config("tf-unknown");
        assert!(fallback.camera_enabled);
        assert_eq!(fallback.video_url.as_deref(), Some("https://cam.example.com/live"));
    }

    #[test]
    fn test_blank_video_url_is_not_active() {
        let config = ParcelConfig {
            camera_enabled: true,
            video_url: Some("   ".to_string()),
        };
        assert!(config.active_video_url().is_none());
    }

    #[test]
    fn test_legacy_record_defaults() {
        let json = r#"{
            "id": "6f1c1f5e-0d7e-4a47-9c1b-0b0e8f3f8b11",
            "code": "ABCDEFGH",
            "client_name": "Awa",
            "expires_at": "2030-01-01T00:00:00Z",
            "created_at": "2024-01-01T00:00:00Z"
        }"#;
        let code: AccessCode = serde_json::from_str(json).unwrap();
        assert!(code.active);
        assert_eq!(code.profile_type, ProfileType::Prospect);
        assert!(code.is_wildcard_scope());
    }
}
