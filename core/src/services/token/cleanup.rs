//! Token cleanup service for periodic removal of long-expired records
//!
//! Physical deletion is housekeeping only. Expired records are already
//! inactive, so nothing depends on how quickly this runs.

use chrono::{Duration, Utc};
use ld_shared::config::RefreshTokenConfig;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::errors::DomainError;
use crate::repositories::TokenRepository;

use super::expiry::ExpiryPolicy;

/// Configuration for token cleanup service
#[derive(Debug, Clone)]
pub struct TokenCleanupConfig {
    /// How often to run cleanup (in seconds)
    pub interval_seconds: u64,
    /// How long expired records are kept before deletion (in seconds)
    pub grace_period_seconds: i64,
    /// Whether to enable automatic cleanup
    pub enabled: bool,
}

impl Default for TokenCleanupConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 3600,
            grace_period_seconds: 86400,
            enabled: true,
        }
    }
}

impl From<&RefreshTokenConfig> for TokenCleanupConfig {
    fn from(config: &RefreshTokenConfig) -> Self {
        Self {
            interval_seconds: config.cleanup_interval_seconds,
            grace_period_seconds: config.cleanup_grace_period_seconds,
            enabled: config.cleanup_enabled,
        }
    }
}

/// Service for deleting expired refresh token records
pub struct TokenCleanupService<R: TokenRepository + 'static> {
    repository: Arc<R>,
    config: TokenCleanupConfig,
}

impl<R: TokenRepository + 'static> TokenCleanupService<R> {
    /// Create a new token cleanup service
    pub fn new(repository: Arc<R>, config: TokenCleanupConfig) -> Self {
        Self { repository, config }
    }

    /// Run a single cleanup cycle
    ///
    /// Deletes records whose expiry lies further in the past than the
    /// grace period. Store failures are collected into the result rather
    /// than returned, so a background loop keeps running.
    ///
    /// # Returns
    /// * `Ok(CleanupResult)` - Summary of the cycle
    pub async fn run_cleanup(&self) -> Result<CleanupResult, DomainError> {
        if !self.config.enabled {
            return Ok(CleanupResult::default());
        }

        debug!("Starting token cleanup cycle");

        let mut result = CleanupResult::default();
        let cutoff = ExpiryPolicy::deletion_cutoff(
            Utc::now(),
            Duration::try_seconds(self.config.grace_period_seconds.max(0)).unwrap_or(Duration::MAX),
        );

        match self.repository.delete_expired(cutoff).await {
            Ok(count) => {
                result.expired_tokens_deleted = count;
                info!(deleted = count, cutoff = %cutoff, "Deleted expired refresh tokens");
            }
            Err(e) => {
                error!(error = %e, "Failed to delete expired refresh tokens");
                result.errors.push(e.to_string());
            }
        }

        Ok(result)
    }

    /// Start the cleanup service as a background task
    ///
    /// Returns `None` without spawning when cleanup is disabled.
    pub fn start_background_task(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            warn!("Token cleanup service is disabled");
            return None;
        }

        let interval = std::time::Duration::from_secs(self.config.interval_seconds.max(1));

        Some(tokio::spawn(async move {
            info!(
                interval_seconds = self.config.interval_seconds,
                grace_period_seconds = self.config.grace_period_seconds,
                "Token cleanup task started"
            );

            let mut interval_timer = tokio::time::interval(interval);

            loop {
                interval_timer.tick().await;

                match self.run_cleanup().await {
                    Ok(result) => {
                        if !result.is_success() {
                            warn!(errors = ?result.errors, "Token cleanup cycle completed with errors");
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "Token cleanup cycle failed");
                    }
                }
            }
        }))
    }
}

/// Result of a cleanup operation
#[derive(Debug, Default)]
pub struct CleanupResult {
    /// Number of expired refresh tokens deleted
    pub expired_tokens_deleted: usize,
    /// Any errors encountered during cleanup
    pub errors: Vec<String>,
}

impl CleanupResult {
    /// Check if the cleanup was successful (no errors)
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}
