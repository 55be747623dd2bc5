//! Rotation coordinator: exchanges a refresh credential for its successor

use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::entities::{RequestMetadata, RevocationReason};
use crate::errors::{DomainError, TokenError};
use crate::repositories::TokenRepository;

use super::credential::{digest_credential, digest_prefix};
use super::issuer::{IssuedToken, TokenIssuer};

/// Outcome of a successful rotation
#[derive(Debug, Clone)]
pub struct RotatedToken {
    pub user_id: Uuid,
    /// Record that was retired by this rotation
    pub previous_id: Uuid,
    /// The descendant credential and record
    pub issued: IssuedToken,
}

/// Single-use rotation of refresh credentials.
///
/// A credential can be exchanged at most once. When several callers present
/// the same credential at the same time, the store's conditional transition
/// picks exactly one winner and only the winner receives a descendant.
pub struct RotationCoordinator<R: TokenRepository> {
    repository: Arc<R>,
    issuer: TokenIssuer<R>,
}

impl<R: TokenRepository> RotationCoordinator<R> {
    pub fn new(repository: Arc<R>, issuer: TokenIssuer<R>) -> Self {
        Self { repository, issuer }
    }

    /// Rotate a presented credential
    ///
    /// Unknown, expired, revoked and already-rotated credentials all yield
    /// `TokenError::InvalidRefreshToken`.
    pub async fn rotate(
        &self,
        presented: &str,
        metadata: RequestMetadata,
    ) -> Result<RotatedToken, DomainError> {
        let digest = digest_credential(presented);

        let record = match self.repository.find_active_by_digest(&digest).await? {
            Some(record) => record,
            None => {
                debug!(digest = digest_prefix(&digest), "Rotation rejected: no active record");
                return Err(TokenError::InvalidRefreshToken.into());
            }
        };

        let transitioned = self
            .repository
            .mark_revoked_if_active(record.id, RevocationReason::Rotated, &metadata)
            .await?;

        if !transitioned {
            warn!(
                token_id = %record.id,
                user_id = %record.user_id,
                digest = record.digest_prefix(),
                "Rotation lost to a concurrent use of the same refresh token"
            );
            return Err(TokenError::InvalidRefreshToken.into());
        }

        let issued = self.issuer.issue(record.user_id, metadata).await.map_err(|e| {
            error!(
                token_id = %record.id,
                user_id = %record.user_id,
                error = %e,
                "Refresh token retired but descendant could not be issued"
            );
            e
        })?;

        self.repository
            .set_replaced_by(record.id, issued.record.id)
            .await
            .map_err(|e| {
                error!(
                    token_id = %record.id,
                    descendant_id = %issued.record.id,
                    error = %e,
                    "Failed to record refresh token lineage"
                );
                e
            })?;

        info!(
            token_id = %record.id,
            descendant_id = %issued.record.id,
            user_id = %record.user_id,
            "Rotated refresh token"
        );

        Ok(RotatedToken {
            user_id: record.user_id,
            previous_id: record.id,
            issued,
        })
    }
}
