use std::sync::Arc;

use chrono::Utc;
use parcelvault_core::generator::{generate_code, normalize_code, DEFAULT_CODE_LENGTH};
use parcelvault_core::models::{AccessCode, AccessGrant};
use parcelvault_core::AppError;
use uuid::Uuid;

use crate::store::Store;

/// Source of candidate code strings.
pub type CodeGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Collisions with an active code are retried this many times before giving up.
pub const MAX_GENERATION_ATTEMPTS: usize = 8;

/// Repository for issued access codes
#[derive(Clone)]
pub struct AccessCodeRepository {
    store: Arc<Store>,
    generator: CodeGenerator,
}

impl AccessCodeRepository {
    pub fn new(store: Arc<Store>) -> Self {
        Self::with_generator(store, Arc::new(|| generate_code(DEFAULT_CODE_LENGTH)))
    }

    pub fn with_generator(store: Arc<Store>, generator: CodeGenerator) -> Self {
        Self { store, generator }
    }

    /// Issue a new code for `grant`.
    ///
    /// The uniqueness check and the insert happen inside one store write, so two
    /// concurrent creates can never end up holding the same active code.
    #[tracing::instrument(skip(self, grant), fields(db.table = "access_codes", db.operation = "insert"))]
    pub async fn create(&self, grant: AccessGrant) -> Result<AccessCode, AppError> {
        let grant = grant.normalized();
        let generator = self.generator.clone();

        let code = self
            .store
            .write(|snap| {
                for _ in 0..MAX_GENERATION_ATTEMPTS {
                    let candidate = normalize_code(&generator());
                    let taken = snap
                        .access_codes
                        .iter()
                        .any(|c| c.active && c.code.eq_ignore_ascii_case(&candidate));
                    if taken {
                        tracing::debug!("Generated code collides with an active code, retrying");
                        continue;
                    }
                    let code = grant.clone().into_access_code(candidate, Utc::now());
                    snap.access_codes.push(code.clone());
                    return Ok(code);
                }
                Err(AppError::Internal(format!(
                    "Could not generate a unique access code after {} attempts",
                    MAX_GENERATION_ATTEMPTS
                )))
            })
            .await?;

        tracing::info!(
            access_code_id = %code.id,
            profile_type = %code.profile_type,
            parcels = code.parcelle_ids.len(),
            expires_at = %code.expires_at,
            "Access code issued"
        );
        Ok(code)
    }

    /// Case-insensitive lookup.
    ///
    /// A revoked code may share its string with a later active one; the active record
    /// wins, otherwise the most recently created inactive record is returned.
    #[tracing::instrument(skip(self, code), fields(db.table = "access_codes", db.operation = "select"))]
    pub async fn find_by_code(&self, code: &str) -> Result<Option<AccessCode>, AppError> {
        let wanted = normalize_code(code);
        if wanted.is_empty() {
            return Ok(None);
        }
        let snap = self.store.read().await;
        let matches = snap
            .access_codes
            .iter()
            .filter(|c| c.code.eq_ignore_ascii_case(&wanted));

        let mut latest_inactive: Option<&AccessCode> = None;
        for candidate in matches {
            if candidate.active {
                return Ok(Some(candidate.clone()));
            }
            latest_inactive = Some(candidate);
        }
        Ok(latest_inactive.cloned())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<AccessCode>, AppError> {
        let snap = self.store.read().await;
        Ok(snap.access_codes.iter().find(|c| c.id == id).cloned())
    }

    /// All codes in creation order, revoked ones included.
    pub async fn list(&self) -> Result<Vec<AccessCode>, AppError> {
        Ok(self.store.read().await.access_codes.clone())
    }

    /// Mark a code inactive. Revoking an already revoked code is a no-op.
    #[tracing::instrument(skip(self), fields(db.table = "access_codes", db.operation = "update", db.record_id = %id))]
    pub async fn revoke(&self, id: Uuid) -> Result<AccessCode, AppError> {
        let revoked = self
            .store
            .write(|snap| {
                let code = snap
                    .access_codes
                    .iter_mut()
                    .find(|c| c.id == id)
                    .ok_or_else(|| AppError::NotFound(format!("Access code {} not found", id)))?;
                if code.active {
                    code.active = false;
                    code.revoked_at = Some(Utc::now());
                }
                Ok(code.clone())
            })
            .await?;

        tracing::info!(access_code_id = %id, "Access code revoked");
        Ok(revoked)
    }

    /// Count one successful use. Returns the new count.
    pub async fn increment_usage(&self, id: Uuid) -> Result<u64, AppError> {
        self.store
            .write(|snap| {
                let code = snap
                    .access_codes
                    .iter_mut()
                    .find(|c| c.id == id)
                    .ok_or_else(|| AppError::NotFound(format!("Access code {} not found", id)))?;
                code.usage_count += 1;
                Ok(code.usage_count)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use chrono::Duration;
    use parcelvault_core::generator::CODE_ALPHABET;
    use parcelvault_core::models::ProfileType;
    use std::collections::{BTreeMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn store() -> Arc<Store> {
        Arc::new(Store::open(Arc::new(InMemoryStore::new())).await.unwrap())
    }

    fn grant(profile: ProfileType) -> AccessGrant {
        AccessGrant {
            client_name: "Awa Koné".to_string(),
            client_email: "awa@example.com".to_string(),
            profile_type: profile,
            parcelle_ids: vec!["tf-223737".to_string()],
            parcelle_configs: BTreeMap::new(),
            camera_enabled: false,
            video_url: None,
            expires_at: Utc::now() + Duration::hours(72),
        }
    }

    /// Yields the given codes in order, repeating the last one.
    fn scripted(codes: &'static [&'static str]) -> CodeGenerator {
        let next = AtomicUsize::new(0);
        Arc::new(move || {
            let i = next.fetch_add(1, Ordering::SeqCst).min(codes.len() - 1);
            codes[i].to_string()
        })
    }

    #[tokio::test]
    async fn test_create_issues_code_from_alphabet() {
        let repo = AccessCodeRepository::new(store().await);
        let code = repo.create(grant(ProfileType::Prospect)).await.unwrap();
        assert_eq!(code.code.len(), DEFAULT_CODE_LENGTH);
        assert!(code.code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        assert!(code.active);
        assert_eq!(code.usage_count, 0);
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_retries_on_collision() {
        let repo =
            AccessCodeRepository::with_generator(store().await, scripted(&["AAAAAAAA", "AAAAAAAA", "BBBBBBBB"]));
        let first = repo.create(grant(ProfileType::Prospect)).await.unwrap();
        let second = repo.create(grant(ProfileType::Prospect)).await.unwrap();
        assert_eq!(first.code, "AAAAAAAA");
        assert_eq!(second.code, "BBBBBBBB");
    }

    #[tokio::test]
    async fn test_create_fails_when_generator_keeps_colliding() {
        let repo = AccessCodeRepository::with_generator(store().await, scripted(&["AAAAAAAA"]));
        repo.create(grant(ProfileType::Prospect)).await.unwrap();
        let result = repo.create(grant(ProfileType::Prospect)).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_revoked_code_string_can_be_reissued() {
        let repo = AccessCodeRepository::with_generator(store().await, scripted(&["AAAAAAAA"]));
        let first = repo.create(grant(ProfileType::Prospect)).await.unwrap();
        repo.revoke(first.id).await.unwrap();

        // Inactive match only: the revoked record is reported.
        let found = repo.find_by_code("aaaaaaaa").await.unwrap().unwrap();
        assert!(!found.active);

        let second = repo.create(grant(ProfileType::Proprietaire)).await.unwrap();
        let found = repo.find_by_code("AAAAAAAA").await.unwrap().unwrap();
        assert_eq!(found.id, second.id);
        assert!(found.active);
    }

    #[tokio::test]
    async fn test_find_by_code_is_case_insensitive_and_trims() {
        let repo = AccessCodeRepository::with_generator(store().await, scripted(&["DJ9MFX7J"]));
        let code = repo.create(grant(ProfileType::Proprietaire)).await.unwrap();
        let found = repo.find_by_code("  dj9mfx7j ").await.unwrap().unwrap();
        assert_eq!(found.id, code.id);
        assert!(repo.find_by_code("").await.unwrap().is_none());
        assert!(repo.find_by_code("ZZZZZZZZ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revoke_missing_is_not_found() {
        let repo = AccessCodeRepository::new(store().await);
        let result = repo.revoke(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let repo = AccessCodeRepository::new(store().await);
        let code = repo.create(grant(ProfileType::Prospect)).await.unwrap();
        let first = repo.revoke(code.id).await.unwrap();
        let second = repo.revoke(code.id).await.unwrap();
        assert_eq!(first.revoked_at, second.revoked_at);
        assert!(!second.active);
    }

    #[tokio::test]
    async fn test_increment_usage() {
        let repo = AccessCodeRepository::new(store().await);
        let code = repo.create(grant(ProfileType::Prospect)).await.unwrap();
        assert_eq!(repo.increment_usage(code.id).await.unwrap(), 1);
        assert_eq!(repo.increment_usage(code.id).await.unwrap(), 2);
        let stored = repo.find_by_id(code.id).await.unwrap().unwrap();
        assert_eq!(stored.usage_count, 2);
    }

    #[tokio::test]
    async fn test_concurrent_creates_yield_distinct_active_codes() {
        // Every candidate is produced twice, so each create after the first collides once.
        let counter = AtomicUsize::new(0);
        let generator: CodeGenerator = Arc::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            format!("CODE{}", n / 2)
        });
        let repo = AccessCodeRepository::with_generator(store().await, generator);

        let tasks: Vec<_> = (0..6)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.create(grant(ProfileType::Prospect)).await })
            })
            .collect();

        let mut seen = HashSet::new();
        for result in futures::future::join_all(tasks).await {
            let code = result.unwrap().unwrap();
            assert!(seen.insert(code.code));
        }
        assert_eq!(seen.len(), 6);
        assert_eq!(repo.list().await.unwrap().len(), 6);
    }
}
