//! Token service: one handle over issuance, rotation and revocation

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{RefreshTokenRecord, RequestMetadata, RevocationReason};
use crate::errors::DomainError;
use crate::repositories::TokenRepository;

use super::config::TokenServiceConfig;
use super::expiry::ExpiryPolicy;
use super::issuer::{IssuedToken, TokenIssuer};
use super::revocation::RevocationManager;
use super::rotation::{RotatedToken, RotationCoordinator};

/// Refresh-token lifecycle service
///
/// Holds no state of its own between calls; every instance sharing a
/// repository sees the same records. Handlers and the authentication flow
/// share one instance behind an `Arc`.
pub struct TokenService<R: TokenRepository> {
    repository: Arc<R>,
    expiry: ExpiryPolicy,
    issuer: TokenIssuer<R>,
    rotation: RotationCoordinator<R>,
    revocation: RevocationManager<R>,
}

impl<R: TokenRepository> TokenService<R> {
    /// Create a new token service
    ///
    /// # Arguments
    /// * `repository` - Storage engine for refresh token records
    /// * `config` - Service configuration
    ///
    /// # Returns
    /// * `Err(DomainError::Validation)` - The configured TTL is not positive
    pub fn new(repository: Arc<R>, config: TokenServiceConfig) -> Result<Self, DomainError> {
        let expiry = ExpiryPolicy::from_seconds(config.refresh_token_ttl_seconds)?;
        let issuer = TokenIssuer::new(Arc::clone(&repository), expiry);

        Ok(Self {
            rotation: RotationCoordinator::new(Arc::clone(&repository), issuer.clone()),
            revocation: RevocationManager::new(Arc::clone(&repository)),
            issuer,
            expiry,
            repository,
        })
    }

    /// Issue a refresh token after a successful authentication
    pub async fn issue(
        &self,
        user_id: Uuid,
        metadata: RequestMetadata,
    ) -> Result<IssuedToken, DomainError> {
        self.issuer.issue(user_id, metadata).await
    }

    /// Exchange a presented credential for its descendant
    pub async fn rotate(
        &self,
        presented: &str,
        metadata: RequestMetadata,
    ) -> Result<RotatedToken, DomainError> {
        self.rotation.rotate(presented, metadata).await
    }

    /// Revoke the record behind a presented credential
    pub async fn revoke(
        &self,
        presented: &str,
        reason: RevocationReason,
        metadata: RequestMetadata,
    ) -> Result<Option<RefreshTokenRecord>, DomainError> {
        self.revocation.revoke(presented, reason, metadata).await
    }

    /// Revoke every active record of a user
    pub async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        reason: RevocationReason,
    ) -> Result<usize, DomainError> {
        self.revocation.revoke_all_for_user(user_id, reason).await
    }

    /// Diagnostic lookup; never use the result for authorization
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshTokenRecord>, DomainError> {
        self.repository.find_by_id(id).await
    }

    /// Refresh token lifetime in seconds
    pub fn refresh_token_ttl_seconds(&self) -> i64 {
        self.expiry.ttl_seconds()
    }
}
