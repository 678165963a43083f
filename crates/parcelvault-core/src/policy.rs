//! Profile permission table and the pure access decision.
//!
//! Everything here is a function of an [`AccessCode`] and a clock reading. Looking
//! the code up and counting its usage is done by the access policy engine in the
//! API crate, which calls into this module.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{AccessCode, ProfileType};

/// Fixed permissions per profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfilePolicy {
    pub show_watermark: bool,
    /// Whether surveillance is granted when no per-parcel config says otherwise.
    /// Still requires a resolvable video URL.
    pub surveillance_by_default: bool,
}

impl ProfilePolicy {
    pub const fn for_profile(profile: ProfileType) -> Self {
        match profile {
            ProfileType::Prospect => ProfilePolicy {
                show_watermark: true,
                surveillance_by_default: false,
            },
            ProfileType::Proprietaire => ProfilePolicy {
                show_watermark: false,
                surveillance_by_default: true,
            },
        }
    }
}

/// Why a code was refused. Only ever logged; clients see a generic denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    InvalidCode,
    Revoked,
    Expired,
    OutOfScope,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::InvalidCode => "invalid_code",
            DenialReason::Revoked => "revoked",
            DenialReason::Expired => "expired",
            DenialReason::OutOfScope => "out_of_scope",
        }
    }

    pub fn into_error(self, code: &str, parcel_id: Option<&str>) -> AppError {
        match self {
            DenialReason::InvalidCode => AppError::InvalidCode(code.to_string()),
            DenialReason::Revoked => AppError::RevokedCode(code.to_string()),
            DenialReason::Expired => AppError::ExpiredCode(code.to_string()),
            DenialReason::OutOfScope => AppError::OutOfScope {
                code: code.to_string(),
                parcel_id: parcel_id.unwrap_or_default().to_string(),
            },
        }
    }
}

/// A granted access for one code on one parcel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub access_code_id: Uuid,
    pub code: String,
    pub client_name: String,
    pub profile_type: ProfileType,
    pub parcel_id: String,
    pub show_watermark: bool,
    pub can_access_surveillance: bool,
    pub camera_enabled: bool,
    /// Set only when `can_access_surveillance` is true.
    pub video_url: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Revocation and expiry checks shared by every entry point.
pub fn check_validity(code: &AccessCode, now: DateTime<Utc>) -> Result<(), DenialReason> {
    if !code.active {
        return Err(DenialReason::Revoked);
    }
    if code.is_expired_at(now) {
        return Err(DenialReason::Expired);
    }
    Ok(())
}

pub fn check_scope(code: &AccessCode, parcel_id: &str) -> Result<(), DenialReason> {
    if code.covers_parcel(parcel_id) {
        Ok(())
    } else {
        Err(DenialReason::OutOfScope)
    }
}

/// Validity, scope, then the permission table.
pub fn decide(
    code: &AccessCode,
    parcel_id: &str,
    now: DateTime<Utc>,
) -> Result<Decision, DenialReason> {
    check_validity(code, now)?;
    check_scope(code, parcel_id)?;

    let policy = ProfilePolicy::for_profile(code.profile_type);
    let config = code.resolve_parcel_config(parcel_id);
    let video_url = if policy.surveillance_by_default {
        config.active_video_url().map(str::to_string)
    } else {
        None
    };

    Ok(Decision {
        access_code_id: code.id,
        code: code.code.clone(),
        client_name: code.client_name.clone(),
        profile_type: code.profile_type,
        parcel_id: parcel_id.to_string(),
        show_watermark: policy.show_watermark,
        can_access_surveillance: video_url.is_some(),
        camera_enabled: config.camera_enabled,
        video_url,
        expires_at: code.expires_at,
    })
}
