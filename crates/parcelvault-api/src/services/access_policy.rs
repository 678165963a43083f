//! Access policy engine.
//!
//! Binds the pure decision in `parcelvault_core::policy` to the stores: looks the
//! presented code up, applies validity and scope, counts the use and logs the precise
//! denial reason. Callers only ever see the generic access-denied error.

use chrono::{DateTime, Utc};
use parcelvault_core::models::{AccessCode, Parcel, ProfileType};
use parcelvault_core::policy::{check_scope, check_validity, decide};
use parcelvault_core::{redact_code, AppError, Decision, DenialReason};
use parcelvault_db::{AccessCodeRepository, ParcelRepository};

/// Full scope of a code, expanded to catalog entries.
#[derive(Debug, Clone)]
pub struct OwnerParcels {
    pub client_name: String,
    pub profile_type: ProfileType,
    pub parcels: Vec<Parcel>,
}

impl OwnerParcels {
    pub fn parcel_count(&self) -> usize {
        self.parcels.len()
    }

    pub fn is_multi(&self) -> bool {
        self.parcels.len() > 1
    }
}

#[derive(Clone)]
pub struct AccessPolicyEngine {
    codes: AccessCodeRepository,
    parcels: ParcelRepository,
}

impl AccessPolicyEngine {
    pub fn new(codes: AccessCodeRepository, parcels: ParcelRepository) -> Self {
        Self { codes, parcels }
    }

    fn deny(reason: DenialReason, code: &str, parcel_id: Option<&str>) -> AppError {
        tracing::warn!(
            reason = reason.as_str(),
            parcel_id = parcel_id.unwrap_or("-"),
            code = %redact_code(code),
            "Access denied"
        );
        reason.into_error(code, parcel_id)
    }

    /// Steps 1 to 3: the code exists, is active and has not expired.
    async fn lookup_valid(
        &self,
        code: &str,
        parcel_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<AccessCode, AppError> {
        let record = self
            .codes
            .find_by_code(code)
            .await?
            .ok_or_else(|| Self::deny(DenialReason::InvalidCode, code, parcel_id))?;
        check_validity(&record, now).map_err(|reason| Self::deny(reason, code, parcel_id))?;
        Ok(record)
    }

    /// Validate a code, and its scope when a parcel is named. Counts one use.
    #[tracing::instrument(skip(self, code))]
    pub async fn verify_code(
        &self,
        code: &str,
        parcel_id: Option<&str>,
    ) -> Result<AccessCode, AppError> {
        let mut record = self.lookup_valid(code, parcel_id, Utc::now()).await?;
        if let Some(parcel_id) = parcel_id {
            check_scope(&record, parcel_id)
                .map_err(|reason| Self::deny(reason, code, Some(parcel_id)))?;
        }
        record.usage_count = self.codes.increment_usage(record.id).await?;
        Ok(record)
    }

    /// Decide whether `code` may access `parcel_id`, and in which form.
    pub async fn evaluate(&self, code: &str, parcel_id: &str) -> Result<Decision, AppError> {
        self.evaluate_at(code, parcel_id, Utc::now()).await
    }

    #[tracing::instrument(skip(self, code, now))]
    pub async fn evaluate_at(
        &self,
        code: &str,
        parcel_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Decision, AppError> {
        let record = self
            .codes
            .find_by_code(code)
            .await?
            .ok_or_else(|| Self::deny(DenialReason::InvalidCode, code, Some(parcel_id)))?;
        let decision = decide(&record, parcel_id, now)
            .map_err(|reason| Self::deny(reason, code, Some(parcel_id)))?;
        self.codes.increment_usage(record.id).await?;

        tracing::debug!(
            access_code_id = %decision.access_code_id,
            profile_type = %decision.profile_type,
            show_watermark = decision.show_watermark,
            can_access_surveillance = decision.can_access_surveillance,
            "Access granted"
        );
        Ok(decision)
    }

    /// Every parcel a code may see. Wildcard scope expands to the whole catalog;
    /// listed ids missing from the catalog are skipped.
    #[tracing::instrument(skip(self, code))]
    pub async fn resolve_owner_parcelles(&self, code: &str) -> Result<OwnerParcels, AppError> {
        let record = self.lookup_valid(code, None, Utc::now()).await?;
        let catalog = self.parcels.list().await?;

        let parcels = if record.is_wildcard_scope() {
            catalog
        } else {
            record
                .parcelle_ids
                .iter()
                .filter_map(|id| {
                    let found = catalog.iter().find(|p| &p.id == id).cloned();
                    if found.is_none() {
                        tracing::debug!(parcel_id = %id, "Scoped parcel missing from catalog");
                    }
                    found
                })
                .collect()
        };

        Ok(OwnerParcels {
            client_name: record.client_name,
            profile_type: record.profile_type,
            parcels,
        })
    }
}
