//! Behaviour every token store must share, run against live engines

#![allow(dead_code)]

use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use ld_core::domain::entities::{RefreshTokenRecord, RequestMetadata, RevocationReason};
use ld_core::errors::{DomainError, TokenError};
use ld_core::repositories::TokenRepository;
use ld_core::services::token::credential::{digest_credential, generate_credential};

/// Load `.env` and route logs to the test harness
pub fn init_test_env() {
    dotenvy::dotenv().ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter("ld_infra=debug")
        .with_test_writer()
        .try_init();
}

pub fn new_record(user_id: Uuid, ttl: Duration) -> RefreshTokenRecord {
    let now = Utc::now();
    RefreshTokenRecord::new(
        user_id,
        digest_credential(&generate_credential()),
        now,
        now + ttl,
        RequestMetadata::new(Some("127.0.0.1".to_string()), Some("integration-test".to_string())),
    )
}

pub async fn insert_find_and_collide<R: TokenRepository>(repo: &R) {
    let record = new_record(Uuid::new_v4(), Duration::days(1));
    repo.insert(record.clone()).await.unwrap();

    let found = repo
        .find_active_by_digest(&record.credential_digest)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, record.id);
    assert_eq!(found.user_id, record.user_id);
    assert_eq!(found.metadata, record.metadata);

    let mut duplicate = new_record(record.user_id, Duration::days(1));
    duplicate.credential_digest = record.credential_digest.clone();
    assert!(matches!(
        repo.insert(duplicate).await,
        Err(DomainError::Token(TokenError::DigestCollision))
    ));
}

pub async fn revoke_once_and_link_descendant<R: TokenRepository>(repo: &R) {
    let parent = new_record(Uuid::new_v4(), Duration::days(1));
    let child = new_record(parent.user_id, Duration::days(1));
    repo.insert(parent.clone()).await.unwrap();
    repo.insert(child.clone()).await.unwrap();

    let metadata = RequestMetadata::new(Some("10.1.1.1".to_string()), None);
    assert!(repo
        .mark_revoked_if_active(parent.id, RevocationReason::Rotated, &metadata)
        .await
        .unwrap());
    assert!(!repo
        .mark_revoked_if_active(parent.id, RevocationReason::Rotated, &metadata)
        .await
        .unwrap());

    repo.set_replaced_by(parent.id, child.id).await.unwrap();
    assert!(repo.set_replaced_by(parent.id, Uuid::new_v4()).await.is_err());

    let stored = repo.find_by_id(parent.id).await.unwrap().unwrap();
    assert_eq!(stored.revoked_reason, Some(RevocationReason::Rotated));
    assert_eq!(stored.replaced_by, Some(child.id));
    assert_eq!(stored.revocation_metadata.unwrap().ip.as_deref(), Some("10.1.1.1"));
    assert!(repo
        .find_active_by_digest(&parent.credential_digest)
        .await
        .unwrap()
        .is_none());
}

pub async fn concurrent_revocation_has_one_winner<R: TokenRepository + 'static>(repo: Arc<R>) {
    let record = new_record(Uuid::new_v4(), Duration::days(1));
    repo.insert(record.clone()).await.unwrap();

    let id = record.id;
    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..16 {
        let repo = repo.clone();
        tasks.spawn(async move {
            repo.mark_revoked_if_active(id, RevocationReason::Rotated, &RequestMetadata::default())
                .await
                .unwrap()
        });
    }

    let mut winners = 0;
    while let Some(won) = tasks.join_next().await {
        if won.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

pub async fn revoke_all_for_one_user<R: TokenRepository>(repo: &R) {
    let user = Uuid::new_v4();
    let other = Uuid::new_v4();
    let a = new_record(user, Duration::days(1));
    let b = new_record(user, Duration::days(1));
    let c = new_record(other, Duration::days(1));
    for record in [&a, &b, &c] {
        repo.insert(record.clone()).await.unwrap();
    }

    let count = repo
        .revoke_all_active_for_user(user, RevocationReason::UserLogoutAll)
        .await
        .unwrap();
    assert_eq!(count, 2);
    assert!(!repo.is_active(&a.credential_digest).await.unwrap());
    assert!(!repo.is_active(&b.credential_digest).await.unwrap());
    assert!(repo.is_active(&c.credential_digest).await.unwrap());
}

pub async fn expired_record_is_inactive<R: TokenRepository>(repo: &R) {
    let record = new_record(Uuid::new_v4(), Duration::seconds(1));
    repo.insert(record.clone()).await.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;

    assert!(repo
        .find_active_by_digest(&record.credential_digest)
        .await
        .unwrap()
        .is_none());
    assert!(!repo
        .mark_revoked_if_active(record.id, RevocationReason::UserLogout, &RequestMetadata::default())
        .await
        .unwrap());
}
