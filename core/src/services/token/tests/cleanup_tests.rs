//! Unit tests for token cleanup service

use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{RefreshTokenRecord, RequestMetadata};
use crate::repositories::{InMemoryTokenRepository, TokenRepository};
use crate::services::token::{TokenCleanupConfig, TokenCleanupService};

async fn seed(repository: &InMemoryTokenRepository, digest: &str, expires_in: Duration) {
    let now = Utc::now();
    let record = RefreshTokenRecord::new(
        Uuid::new_v4(),
        digest.to_string(),
        now - Duration::days(30),
        now + expires_in,
        RequestMetadata::default(),
    );
    repository.insert(record).await.unwrap();
}

#[tokio::test]
async fn test_cleanup_deletes_only_records_past_grace_period() {
    let repository = Arc::new(InMemoryTokenRepository::new());
    seed(&repository, "ancient", Duration::days(-10)).await;
    seed(&repository, "recent", Duration::hours(-2)).await;
    seed(&repository, "live", Duration::days(3)).await;

    let service = TokenCleanupService::new(
        repository.clone(),
        TokenCleanupConfig {
            interval_seconds: 60,
            grace_period_seconds: 86400,
            enabled: true,
        },
    );

    let result = service.run_cleanup().await.unwrap();
    assert!(result.is_success());
    assert_eq!(result.expired_tokens_deleted, 1);
    assert_eq!(repository.len().await, 2);
}

#[tokio::test]
async fn test_disabled_cleanup_does_nothing() {
    let repository = Arc::new(InMemoryTokenRepository::new());
    seed(&repository, "ancient", Duration::days(-10)).await;

    let service = Arc::new(TokenCleanupService::new(
        repository.clone(),
        TokenCleanupConfig {
            enabled: false,
            ..Default::default()
        },
    ));

    let result = service.run_cleanup().await.unwrap();
    assert_eq!(result.expired_tokens_deleted, 0);
    assert_eq!(repository.len().await, 1);
    assert!(service.start_background_task().is_none());
}

#[tokio::test]
async fn test_background_task_runs_first_cycle_immediately() {
    let repository = Arc::new(InMemoryTokenRepository::new());
    seed(&repository, "ancient", Duration::days(-10)).await;

    let service = Arc::new(TokenCleanupService::new(
        repository.clone(),
        TokenCleanupConfig {
            interval_seconds: 3600,
            grace_period_seconds: 0,
            enabled: true,
        },
    ));

    let handle = service.start_background_task().unwrap();
    for _ in 0..50 {
        if repository.is_empty().await {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    handle.abort();

    assert!(repository.is_empty().await);
}
