//! Token lifecycle error types

use thiserror::Error;

/// Refresh-token errors
///
/// `InvalidRefreshToken` deliberately covers unknown, expired, revoked and
/// replayed credentials alike, so a caller learns nothing about why a
/// presented credential failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Credential digest collision")]
    DigestCollision,
}
