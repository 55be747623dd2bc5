//! Token issuer: mints a credential and persists its record

use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::entities::{RefreshTokenRecord, RequestMetadata};
use crate::errors::{DomainError, TokenError};
use crate::repositories::TokenRepository;

use super::credential::{digest_credential, generate_credential};
use super::expiry::ExpiryPolicy;

/// A freshly issued credential together with its stored record.
///
/// `credential` is the only copy of the plaintext. It is not printed by the
/// `Debug` implementation.
#[derive(Clone)]
pub struct IssuedToken {
    pub credential: String,
    pub record: RefreshTokenRecord,
}

impl IssuedToken {
    pub fn into_parts(self) -> (String, RefreshTokenRecord) {
        (self.credential, self.record)
    }
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("credential", &"[REDACTED]")
            .field("record", &self.record)
            .finish()
    }
}

/// Creates new refresh token records
pub struct TokenIssuer<R: TokenRepository> {
    repository: Arc<R>,
    expiry: ExpiryPolicy,
}

impl<R: TokenRepository> Clone for TokenIssuer<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            expiry: self.expiry,
        }
    }
}

impl<R: TokenRepository> TokenIssuer<R> {
    pub fn new(repository: Arc<R>, expiry: ExpiryPolicy) -> Self {
        Self { repository, expiry }
    }

    pub fn expiry(&self) -> &ExpiryPolicy {
        &self.expiry
    }

    /// Issue a new refresh token for `user_id`
    ///
    /// # Arguments
    /// * `user_id` - The authenticated user
    /// * `metadata` - Context of the issuing request
    ///
    /// # Returns
    /// * `Ok(IssuedToken)` - Plaintext credential and the stored record
    /// * `Err(DomainError::StorageUnavailable)` - The store failed
    /// * `Err(DomainError::Token(TokenError::DigestCollision))` - Duplicate digest, not retried
    pub async fn issue(
        &self,
        user_id: Uuid,
        metadata: RequestMetadata,
    ) -> Result<IssuedToken, DomainError> {
        let credential = generate_credential();
        let issued_at = Utc::now();
        let expires_at = self.expiry.expires_at(issued_at)?;
        let record = RefreshTokenRecord::new(
            user_id,
            digest_credential(&credential),
            issued_at,
            expires_at,
            metadata,
        );

        let record = self.repository.insert(record).await.map_err(|e| {
            if matches!(e, DomainError::Token(TokenError::DigestCollision)) {
                error!(user_id = %user_id, "Refresh credential digest collided with an existing record");
            }
            e
        })?;

        info!(
            token_id = %record.id,
            user_id = %record.user_id,
            digest = record.digest_prefix(),
            expires_at = %record.expires_at,
            "Issued refresh token"
        );

        Ok(IssuedToken { credential, record })
    }
}
