//! In-process token repository backed by a single async lock

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::{RefreshTokenRecord, RequestMetadata, RevocationReason};
use crate::errors::{DomainError, TokenError};

use super::r#trait::TokenRepository;

#[derive(Debug, Default)]
struct Records {
    by_id: HashMap<Uuid, RefreshTokenRecord>,
    by_digest: HashMap<String, Uuid>,
}

/// Token repository that keeps records in process memory.
///
/// All conditional transitions run under the write half of one lock, so
/// they are atomic with respect to each other. Records do not survive a
/// restart. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTokenRepository {
    records: Arc<RwLock<Records>>,
}

impl InMemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored records, in any state
    pub async fn len(&self) -> usize {
        self.records.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Every record owned by `user_id`, oldest first
    pub async fn records_for_user(&self, user_id: Uuid) -> Vec<RefreshTokenRecord> {
        let records = self.records.read().await;
        let mut owned: Vec<RefreshTokenRecord> = records
            .by_id
            .values()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by_key(|record| record.issued_at);
        owned
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn insert(&self, record: RefreshTokenRecord) -> Result<RefreshTokenRecord, DomainError> {
        let mut records = self.records.write().await;

        if records.by_digest.contains_key(&record.credential_digest) {
            return Err(TokenError::DigestCollision.into());
        }
        if records.by_id.contains_key(&record.id) {
            return Err(DomainError::internal(format!(
                "Refresh token {} already exists",
                record.id
            )));
        }

        records
            .by_digest
            .insert(record.credential_digest.clone(), record.id);
        records.by_id.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_active_by_digest(
        &self,
        credential_digest: &str,
    ) -> Result<Option<RefreshTokenRecord>, DomainError> {
        let records = self.records.read().await;
        let now = Utc::now();

        Ok(records
            .by_digest
            .get(credential_digest)
            .and_then(|id| records.by_id.get(id))
            .filter(|record| record.is_active_at(now))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshTokenRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records.by_id.get(&id).cloned())
    }

    async fn mark_revoked_if_active(
        &self,
        id: Uuid,
        reason: RevocationReason,
        metadata: &RequestMetadata,
    ) -> Result<bool, DomainError> {
        let mut records = self.records.write().await;

        Ok(match records.by_id.get_mut(&id) {
            Some(record) => record.mark_revoked(reason, Utc::now(), metadata),
            None => false,
        })
    }

    async fn set_replaced_by(&self, id: Uuid, descendant_id: Uuid) -> Result<(), DomainError> {
        let mut records = self.records.write().await;

        let record = records
            .by_id
            .get_mut(&id)
            .ok_or_else(|| DomainError::internal(format!("Refresh token {} not found", id)))?;

        if record.set_replaced_by(descendant_id) {
            Ok(())
        } else {
            Err(DomainError::internal(format!(
                "Refresh token {} already has a descendant",
                id
            )))
        }
    }

    async fn revoke_all_active_for_user(
        &self,
        user_id: Uuid,
        reason: RevocationReason,
    ) -> Result<usize, DomainError> {
        let mut records = self.records.write().await;
        let now = Utc::now();
        let metadata = RequestMetadata::default();

        let mut count = 0;
        for record in records.by_id.values_mut() {
            if record.user_id == user_id && record.mark_revoked(reason, now, &metadata) {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn delete_expired(&self, older_than: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut records = self.records.write().await;

        let doomed: Vec<(Uuid, String)> = records
            .by_id
            .values()
            .filter(|record| record.expires_at < older_than)
            .map(|record| (record.id, record.credential_digest.clone()))
            .collect();

        for (id, digest) in &doomed {
            records.by_id.remove(id);
            records.by_digest.remove(digest);
        }

        Ok(doomed.len())
    }
}
