//! Token repository trait defining the durable home of refresh token records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::{RefreshTokenRecord, RequestMetadata, RevocationReason};
use crate::errors::DomainError;

/// Persistence contract for refresh token records
///
/// Every engine must make the conditional transitions atomic against
/// concurrent callers: of any number of simultaneous
/// [`mark_revoked_if_active`](TokenRepository::mark_revoked_if_active) calls
/// on the same record, exactly one observes `true`. Records are never
/// deleted except through [`delete_expired`](TokenRepository::delete_expired).
///
/// # Security Considerations
/// - Only credential digests are stored, never plaintext
/// - Storage failures surface as `DomainError::StorageUnavailable`
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Persist a new record
    ///
    /// # Arguments
    /// * `record` - The record to persist; its digest must be unique
    ///
    /// # Returns
    /// * `Ok(RefreshTokenRecord)` - The stored record
    /// * `Err(DomainError::Token(TokenError::DigestCollision))` - Digest already present
    /// * `Err(DomainError::StorageUnavailable)` - The store could not be reached
    ///
    /// # Example
    /// ```no_run
    /// # use chrono::{Duration, Utc};
    /// # use uuid::Uuid;
    /// # use ld_core::domain::entities::{RefreshTokenRecord, RequestMetadata};
    /// # use ld_core::repositories::TokenRepository;
    /// # async fn example(repo: &impl TokenRepository) -> Result<(), Box<dyn std::error::Error>> {
    /// let now = Utc::now();
    /// let record = RefreshTokenRecord::new(
    ///     Uuid::new_v4(),
    ///     "sha256_hex_digest".to_string(),
    ///     now,
    ///     now + Duration::days(7),
    ///     RequestMetadata::default(),
    /// );
    ///
    /// let stored = repo.insert(record).await?;
    /// println!("Stored refresh token {}", stored.id);
    /// # Ok(())
    /// # }
    /// ```
    async fn insert(&self, record: RefreshTokenRecord) -> Result<RefreshTokenRecord, DomainError>;

    /// Find the record for a digest, but only while it is active
    ///
    /// Revoked and expired records are reported as absent.
    ///
    /// # Arguments
    /// * `credential_digest` - Digest of the presented credential
    ///
    /// # Returns
    /// * `Ok(Some(RefreshTokenRecord))` - Active record found
    /// * `Ok(None)` - Unknown, revoked or expired
    async fn find_active_by_digest(
        &self,
        credential_digest: &str,
    ) -> Result<Option<RefreshTokenRecord>, DomainError>;

    /// Find a record by id regardless of its state
    async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshTokenRecord>, DomainError>;

    /// Atomically revoke a record if, and only if, it is currently active
    ///
    /// # Arguments
    /// * `id` - Record to revoke
    /// * `reason` - Reason stored with the transition
    /// * `metadata` - Context of the revoking request
    ///
    /// # Returns
    /// * `Ok(true)` - This call performed the transition
    /// * `Ok(false)` - Record missing, already revoked or expired
    async fn mark_revoked_if_active(
        &self,
        id: Uuid,
        reason: RevocationReason,
        metadata: &RequestMetadata,
    ) -> Result<bool, DomainError>;

    /// Record the direct descendant of a rotated record
    ///
    /// Each record has at most one descendant, so calling this twice for the
    /// same `id` is an error, as is calling it for a missing record.
    ///
    /// # Returns
    /// * `Ok(())` - Lineage recorded
    /// * `Err(DomainError::Internal)` - Record missing or already has a descendant
    async fn set_replaced_by(&self, id: Uuid, descendant_id: Uuid) -> Result<(), DomainError>;

    /// Revoke every active record belonging to `user_id`
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records this call transitioned
    ///
    /// # Example
    /// ```no_run
    /// # use uuid::Uuid;
    /// # use ld_core::domain::entities::RevocationReason;
    /// # use ld_core::repositories::TokenRepository;
    /// # async fn example(repo: &impl TokenRepository, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
    /// let revoked = repo
    ///     .revoke_all_active_for_user(user_id, RevocationReason::UserLogoutAll)
    ///     .await?;
    /// println!("Revoked {} sessions", revoked);
    /// # Ok(())
    /// # }
    /// ```
    async fn revoke_all_active_for_user(
        &self,
        user_id: Uuid,
        reason: RevocationReason,
    ) -> Result<usize, DomainError>;

    /// Physically delete records whose expiry lies before `older_than`
    ///
    /// Engines with native expiry may report `0` and let the store reclaim
    /// the records on its own.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records deleted
    async fn delete_expired(&self, older_than: DateTime<Utc>) -> Result<usize, DomainError>;

    /// Check whether a digest belongs to an active record
    async fn is_active(&self, credential_digest: &str) -> Result<bool, DomainError> {
        Ok(self.find_active_by_digest(credential_digest).await?.is_some())
    }
}
