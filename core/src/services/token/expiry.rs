//! Lifetime rules for refresh tokens

use chrono::{DateTime, Duration, Utc};
use ld_shared::config::MAX_REFRESH_TOKEN_TTL_SECONDS;

use crate::domain::entities::RefreshTokenRecord;
use crate::errors::{DomainError, DomainResult};

/// Logical expiry of refresh tokens.
///
/// Expiry never needs a write: a record is inactive from `expires_at`
/// onward no matter what physical cleanup has or has not happened.
#[derive(Debug, Clone, Copy)]
pub struct ExpiryPolicy {
    ttl: Duration,
}

impl ExpiryPolicy {
    /// Build a policy from a lifetime in seconds, which must lie in
    /// `1..=MAX_REFRESH_TOKEN_TTL_SECONDS`
    pub fn from_seconds(ttl_seconds: i64) -> DomainResult<Self> {
        if ttl_seconds <= 0 || ttl_seconds > MAX_REFRESH_TOKEN_TTL_SECONDS {
            return Err(DomainError::Validation {
                message: format!(
                    "Refresh token TTL must be between 1 and {} seconds, got {}",
                    MAX_REFRESH_TOKEN_TTL_SECONDS, ttl_seconds
                ),
            });
        }
        let ttl = Duration::try_seconds(ttl_seconds).ok_or_else(|| DomainError::Validation {
            message: format!("Refresh token TTL of {} seconds is out of range", ttl_seconds),
        })?;
        Ok(Self { ttl })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Absolute expiry for a credential issued at `issued_at`
    ///
    /// # Returns
    /// * `Err(DomainError::Internal)` - The expiry is not representable
    pub fn expires_at(&self, issued_at: DateTime<Utc>) -> DomainResult<DateTime<Utc>> {
        issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| DomainError::Internal {
                message: format!("Expiry overflows for credential issued at {}", issued_at),
            })
    }

    pub fn is_expired(&self, record: &RefreshTokenRecord, now: DateTime<Utc>) -> bool {
        record.is_expired_at(now)
    }

    /// Time left before the record expires, zero once it has
    pub fn remaining(&self, record: &RefreshTokenRecord, now: DateTime<Utc>) -> Duration {
        (record.expires_at - now).max(Duration::zero())
    }

    /// Records expiring before the returned instant may be physically deleted
    ///
    /// A grace period reaching past the earliest representable instant
    /// yields that instant, so nothing is deleted.
    pub fn deletion_cutoff(now: DateTime<Utc>, grace_period: Duration) -> DateTime<Utc> {
        now.checked_sub_signed(grace_period)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}
