//! Refresh token record and its lifecycle states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of digest characters that may appear in logs
pub const DIGEST_LOG_PREFIX_LEN: usize = 12;

/// Leading characters of a digest, safe to log
pub fn digest_prefix(digest: &str) -> &str {
    &digest[..digest.len().min(DIGEST_LOG_PREFIX_LEN)]
}

/// Maximum stored length of the client identity string
pub const MAX_CLIENT_IDENTITY_LEN: usize = 255;

/// Maximum stored length of a network address (textual IPv6 with IPv4 tail)
pub const MAX_IP_LEN: usize = 45;

/// Diagnostic context of the request that created or retired a record.
///
/// Informational only. Nothing in the token lifecycle makes a decision
/// based on these values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMetadata {
    /// Originating network address
    pub ip: Option<String>,

    /// Client identity string (typically the User-Agent)
    pub client_identity: Option<String>,
}

impl RequestMetadata {
    /// Creates request metadata, truncating oversized fields to their
    /// stored widths
    pub fn new(ip: Option<String>, client_identity: Option<String>) -> Self {
        let ip = ip.map(|value| value.chars().take(MAX_IP_LEN).collect::<String>());
        let client_identity = client_identity.map(|value| {
            value
                .chars()
                .take(MAX_CLIENT_IDENTITY_LEN)
                .collect::<String>()
        });
        Self { ip, client_identity }
    }

    /// Returns `true` when neither field is known
    pub fn is_empty(&self) -> bool {
        self.ip.is_none() && self.client_identity.is_none()
    }
}

/// Why a record stopped being active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationReason {
    /// Retired by a successful rotation; the record has a descendant
    Rotated,
    /// Explicit logout of a single session
    UserLogout,
    /// Logout of every session the user holds
    UserLogoutAll,
    /// Any other administrative revocation
    Other,
}

impl RevocationReason {
    /// Stable storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RevocationReason::Rotated => "rotated",
            RevocationReason::UserLogout => "user_logout",
            RevocationReason::UserLogoutAll => "user_logout_all",
            RevocationReason::Other => "other",
        }
    }
}

impl std::fmt::Display for RevocationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RevocationReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rotated" => Ok(RevocationReason::Rotated),
            "user_logout" => Ok(RevocationReason::UserLogout),
            "user_logout_all" => Ok(RevocationReason::UserLogoutAll),
            "other" => Ok(RevocationReason::Other),
            _ => Err(format!("Unknown revocation reason: {}", s)),
        }
    }
}

/// Lifecycle state of a record at a given instant.
///
/// `Active` is the only non-terminal state. Every transition out of it is
/// one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Active,
    Rotated,
    Revoked,
    Expired,
}

/// One row per issued refresh credential.
///
/// Only the digest of the credential is kept; the plaintext leaves the
/// process exactly once, in the response to the issuing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    /// Unique identifier for the record
    pub id: Uuid,

    /// User this token belongs to
    pub user_id: Uuid,

    /// SHA-256 of the credential, lowercase hex; unique across all records
    pub credential_digest: String,

    /// When the credential was issued
    pub issued_at: DateTime<Utc>,

    /// When the credential stops being usable
    pub expires_at: DateTime<Utc>,

    /// When the record was retired, if it was
    pub revoked_at: Option<DateTime<Utc>>,

    /// Why the record was retired
    pub revoked_reason: Option<RevocationReason>,

    /// Direct descendant produced by rotation
    pub replaced_by: Option<Uuid>,

    /// Context of the issuing request
    pub metadata: RequestMetadata,

    /// Context of the request that retired the record
    pub revocation_metadata: Option<RequestMetadata>,
}

impl RefreshTokenRecord {
    /// Creates a new, active record
    ///
    /// # Arguments
    ///
    /// * `user_id` - Owning user
    /// * `credential_digest` - Digest of the plaintext credential
    /// * `issued_at` - Issue timestamp
    /// * `expires_at` - Absolute expiry timestamp
    /// * `metadata` - Context of the issuing request
    pub fn new(
        user_id: Uuid,
        credential_digest: String,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        metadata: RequestMetadata,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            credential_digest,
            issued_at,
            expires_at,
            revoked_at: None,
            revoked_reason: None,
            replaced_by: None,
            metadata,
            revocation_metadata: None,
        }
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Expiry is inclusive: the record is expired from `expires_at` onward
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// A record is active iff it is neither revoked nor expired at `now`
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked() && !self.is_expired_at(now)
    }

    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }

    /// Classifies the record at `now`
    pub fn state_at(&self, now: DateTime<Utc>) -> TokenState {
        match (self.revoked_at, self.revoked_reason) {
            (Some(_), Some(RevocationReason::Rotated)) => TokenState::Rotated,
            (Some(_), _) => TokenState::Revoked,
            (None, _) if self.is_expired_at(now) => TokenState::Expired,
            (None, _) => TokenState::Active,
        }
    }

    /// Applies the active → revoked transition in place.
    ///
    /// Returns `false` and leaves the record untouched if it was not active
    /// at `at`. Storage engines call this while holding exclusive access to
    /// the record.
    pub fn mark_revoked(
        &mut self,
        reason: RevocationReason,
        at: DateTime<Utc>,
        metadata: &RequestMetadata,
    ) -> bool {
        if !self.is_active_at(at) {
            return false;
        }
        self.revoked_at = Some(at);
        self.revoked_reason = Some(reason);
        self.revocation_metadata = Some(metadata.clone());
        true
    }

    /// Records the direct descendant. Returns `false` if one is already set.
    pub fn set_replaced_by(&mut self, descendant_id: Uuid) -> bool {
        if self.replaced_by.is_some() {
            return false;
        }
        self.replaced_by = Some(descendant_id);
        true
    }

    /// Leading characters of the digest, safe to log
    pub fn digest_prefix(&self) -> &str {
        digest_prefix(&self.credential_digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record_expiring_in(duration: Duration) -> RefreshTokenRecord {
        let now = Utc::now();
        RefreshTokenRecord::new(
            Uuid::new_v4(),
            "a".repeat(64),
            now,
            now + duration,
            RequestMetadata::default(),
        )
    }

    #[test]
    fn test_new_record_is_active() {
        let record = record_expiring_in(Duration::days(7));

        assert!(record.is_active());
        assert!(!record.is_revoked());
        assert_eq!(record.state_at(Utc::now()), TokenState::Active);
        assert!(record.replaced_by.is_none());
    }

    #[test]
    fn test_expiry_is_inclusive() {
        let record = record_expiring_in(Duration::hours(1));

        assert!(record.is_active_at(record.expires_at - Duration::seconds(1)));
        assert!(!record.is_active_at(record.expires_at));
        assert_eq!(record.state_at(record.expires_at), TokenState::Expired);
    }

    #[test]
    fn test_mark_revoked_transitions_once() {
        let mut record = record_expiring_in(Duration::days(1));
        let metadata = RequestMetadata::new(Some("10.0.0.1".to_string()), None);
        let now = Utc::now();

        assert!(record.mark_revoked(RevocationReason::UserLogout, now, &metadata));
        assert_eq!(record.revoked_at, Some(now));
        assert_eq!(record.revoked_reason, Some(RevocationReason::UserLogout));
        assert_eq!(record.revocation_metadata, Some(metadata.clone()));

        // Second attempt must not overwrite the first transition
        assert!(!record.mark_revoked(RevocationReason::Other, Utc::now(), &metadata));
        assert_eq!(record.revoked_reason, Some(RevocationReason::UserLogout));
        assert_eq!(record.state_at(Utc::now()), TokenState::Revoked);
    }

    #[test]
    fn test_mark_revoked_refuses_expired_record() {
        let mut record = record_expiring_in(Duration::seconds(-5));

        assert!(!record.mark_revoked(RevocationReason::Rotated, Utc::now(), &RequestMetadata::default()));
        assert!(record.revoked_at.is_none());
        assert_eq!(record.state_at(Utc::now()), TokenState::Expired);
    }

    #[test]
    fn test_rotated_state_and_replaced_by() {
        let mut record = record_expiring_in(Duration::days(1));
        let descendant = Uuid::new_v4();

        assert!(record.mark_revoked(RevocationReason::Rotated, Utc::now(), &RequestMetadata::default()));
        assert!(record.set_replaced_by(descendant));
        assert!(!record.set_replaced_by(Uuid::new_v4()));

        assert_eq!(record.replaced_by, Some(descendant));
        assert_eq!(record.state_at(Utc::now()), TokenState::Rotated);
    }

    #[test]
    fn test_revocation_reason_round_trip() {
        for reason in [
            RevocationReason::Rotated,
            RevocationReason::UserLogout,
            RevocationReason::UserLogoutAll,
            RevocationReason::Other,
        ] {
            assert_eq!(reason.as_str().parse::<RevocationReason>().unwrap(), reason);
        }
        assert!("expired".parse::<RevocationReason>().is_err());

        let json = serde_json::to_string(&RevocationReason::UserLogoutAll).unwrap();
        assert_eq!(json, "\"user_logout_all\"");
    }

    #[test]
    fn test_metadata_truncates_to_stored_widths() {
        let metadata = RequestMetadata::new(Some("1".repeat(300)), Some("x".repeat(400)));
        assert_eq!(metadata.client_identity.unwrap().len(), MAX_CLIENT_IDENTITY_LEN);
        assert_eq!(metadata.ip.unwrap().len(), MAX_IP_LEN);
        assert!(RequestMetadata::default().is_empty());
    }

    #[test]
    fn test_digest_prefix_never_exposes_full_digest() {
        let record = record_expiring_in(Duration::days(1));
        assert_eq!(record.digest_prefix().len(), DIGEST_LOG_PREFIX_LEN);
    }
}
