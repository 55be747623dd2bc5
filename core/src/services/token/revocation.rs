//! Revocation manager: retires refresh tokens without a successor

use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::entities::{RefreshTokenRecord, RequestMetadata, RevocationReason};
use crate::errors::DomainError;
use crate::repositories::TokenRepository;

use super::credential::{digest_credential, digest_prefix};

pub struct RevocationManager<R: TokenRepository> {
    repository: Arc<R>,
}

impl<R: TokenRepository> RevocationManager<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Revoke the record behind a presented credential
    ///
    /// # Arguments
    /// * `presented` - Plaintext credential from the client
    /// * `reason` - Any reason except `Rotated`, which only rotation may use
    /// * `metadata` - Context of the revoking request
    ///
    /// # Returns
    /// * `Ok(Some(record))` - The record in its revoked state
    /// * `Ok(None)` - No active record, or a concurrent call revoked it first
    /// * `Err(DomainError::Validation)` - `reason` was `Rotated`
    pub async fn revoke(
        &self,
        presented: &str,
        reason: RevocationReason,
        metadata: RequestMetadata,
    ) -> Result<Option<RefreshTokenRecord>, DomainError> {
        if reason == RevocationReason::Rotated {
            return Err(DomainError::Validation {
                message: "Revocation reason 'rotated' is reserved for rotation".to_string(),
            });
        }

        let digest = digest_credential(presented);
        let mut record = match self.repository.find_active_by_digest(&digest).await? {
            Some(record) => record,
            None => {
                debug!(digest = digest_prefix(&digest), "Revocation skipped: no active record");
                return Ok(None);
            }
        };

        let transitioned = self
            .repository
            .mark_revoked_if_active(record.id, reason, &metadata)
            .await?;
        if !transitioned {
            debug!(token_id = %record.id, "Revocation lost to a concurrent transition");
            return Ok(None);
        }

        info!(
            token_id = %record.id,
            user_id = %record.user_id,
            reason = %reason,
            "Revoked refresh token"
        );

        // The store may already have reclaimed an expiring record
        match self.repository.find_by_id(record.id).await? {
            Some(stored) => Ok(Some(stored)),
            None => {
                record.revoked_at = Some(chrono::Utc::now());
                record.revoked_reason = Some(reason);
                record.revocation_metadata = Some(metadata);
                Ok(Some(record))
            }
        }
    }

    /// Revoke every active record of a user
    ///
    /// Returns the number of records this call transitioned; zero is success.
    pub async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        reason: RevocationReason,
    ) -> Result<usize, DomainError> {
        if reason == RevocationReason::Rotated {
            return Err(DomainError::Validation {
                message: "Revocation reason 'rotated' is reserved for rotation".to_string(),
            });
        }

        let count = self
            .repository
            .revoke_all_active_for_user(user_id, reason)
            .await?;

        info!(
            user_id = %user_id,
            reason = %reason,
            revoked = count,
            "Revoked all active refresh tokens for user"
        );

        Ok(count)
    }
}
