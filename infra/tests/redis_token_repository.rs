//! Integration tests for the Redis token repository
//!
//! These tests require a running Redis instance.
//! Run with: cargo test -p ld_infra --test redis_token_repository -- --ignored

mod common;

use std::sync::Arc;

use ld_infra::cache::{CacheConfig, RedisClient, RedisTokenRepository};

async fn repository() -> RedisTokenRepository {
    common::init_test_env();
    let config = CacheConfig::new(
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
    )
    .with_prefix("loandesk_test");

    RedisTokenRepository::new(RedisClient::new(config).await.unwrap())
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_insert_find_and_collide() {
    common::insert_find_and_collide(&repository().await).await;
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_revoke_once_and_link_descendant() {
    common::revoke_once_and_link_descendant(&repository().await).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // Requires Redis server
async fn test_concurrent_revocation_has_one_winner() {
    common::concurrent_revocation_has_one_winner(Arc::new(repository().await)).await;
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_revoke_all_for_one_user() {
    common::revoke_all_for_one_user(&repository().await).await;
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_expired_record_is_inactive() {
    common::expired_record_is_inactive(&repository().await).await;
}
