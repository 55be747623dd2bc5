//! Concurrency tests for refresh token rotation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::domain::entities::{RefreshTokenRecord, RequestMetadata, RevocationReason};
use crate::errors::{DomainError, TokenError};
use crate::repositories::{InMemoryTokenRepository, TokenRepository};
use crate::services::token::{TokenService, TokenServiceConfig};

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_rotation_has_exactly_one_winner() {
    const CALLERS: usize = 32;

    let repository = Arc::new(InMemoryTokenRepository::new());
    let service = Arc::new(
        TokenService::new(repository.clone(), TokenServiceConfig::default()).unwrap(),
    );
    let user_id = Uuid::new_v4();
    let issued = service.issue(user_id, RequestMetadata::default()).await.unwrap();

    let mut tasks = JoinSet::new();
    for _ in 0..CALLERS {
        let service = service.clone();
        let credential = issued.credential.clone();
        tasks.spawn(async move { service.rotate(&credential, RequestMetadata::default()).await });
    }

    let mut successes = 0;
    let mut rejected = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.unwrap() {
            Ok(rotated) => {
                assert_eq!(rotated.user_id, user_id);
                successes += 1;
            }
            Err(DomainError::Token(TokenError::InvalidRefreshToken)) => rejected += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(rejected, CALLERS - 1);

    // Exactly one descendant exists
    let records = repository.records_for_user(user_id).await;
    assert_eq!(records.len(), 2);
    let parent = records.iter().find(|r| r.id == issued.record.id).unwrap();
    let descendants: Vec<_> = records.iter().filter(|r| r.id != issued.record.id).collect();
    assert_eq!(descendants.len(), 1);
    assert_eq!(parent.replaced_by, Some(descendants[0].id));
    assert!(descendants[0].is_active());
}

/// Store that finds the record but always loses the conditional transition,
/// as if another instance had rotated it in between.
struct LosingRaceRepository {
    inner: InMemoryTokenRepository,
}

#[async_trait]
impl TokenRepository for LosingRaceRepository {
    async fn insert(&self, record: RefreshTokenRecord) -> Result<RefreshTokenRecord, DomainError> {
        self.inner.insert(record).await
    }

    async fn find_active_by_digest(&self, digest: &str) -> Result<Option<RefreshTokenRecord>, DomainError> {
        self.inner.find_active_by_digest(digest).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshTokenRecord>, DomainError> {
        self.inner.find_by_id(id).await
    }

    async fn mark_revoked_if_active(
        &self,
        _id: Uuid,
        _reason: RevocationReason,
        _metadata: &RequestMetadata,
    ) -> Result<bool, DomainError> {
        Ok(false)
    }

    async fn set_replaced_by(&self, id: Uuid, descendant_id: Uuid) -> Result<(), DomainError> {
        self.inner.set_replaced_by(id, descendant_id).await
    }

    async fn revoke_all_active_for_user(
        &self,
        user_id: Uuid,
        reason: RevocationReason,
    ) -> Result<usize, DomainError> {
        self.inner.revoke_all_active_for_user(user_id, reason).await
    }

    async fn delete_expired(&self, older_than: DateTime<Utc>) -> Result<usize, DomainError> {
        self.inner.delete_expired(older_than).await
    }
}

#[tokio::test]
async fn test_lost_transition_does_not_issue_descendant() {
    let repository = Arc::new(LosingRaceRepository {
        inner: InMemoryTokenRepository::new(),
    });
    let service = TokenService::new(repository.clone(), TokenServiceConfig::default()).unwrap();
    let user_id = Uuid::new_v4();
    let issued = service.issue(user_id, RequestMetadata::default()).await.unwrap();

    let result = service.rotate(&issued.credential, RequestMetadata::default()).await;
    assert!(result.unwrap_err().is_invalid_refresh_token());

    let records = repository.inner.records_for_user(user_id).await;
    assert_eq!(records.len(), 1);
    assert!(records[0].replaced_by.is_none());

    let revoked = service
        .revoke(&issued.credential, RevocationReason::UserLogout, RequestMetadata::default())
        .await
        .unwrap();
    assert!(revoked.is_none());
}
