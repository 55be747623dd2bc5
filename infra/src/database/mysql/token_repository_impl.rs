//! MySQL implementation of the TokenRepository trait.
//!
//! Every conditional transition is a single `UPDATE ... WHERE revoked_at IS
//! NULL AND expires_at > ?`, so InnoDB row locking decides races and the
//! affected-row count tells the caller whether it won.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use ld_core::domain::entities::{RefreshTokenRecord, RequestMetadata, RevocationReason};
use ld_core::errors::{DomainError, TokenError};
use ld_core::repositories::TokenRepository;

use crate::InfrastructureError;

const SELECT_COLUMNS: &str = r#"
    SELECT id, user_id, credential_digest, issued_at, expires_at, revoked_at,
           revoked_reason, replaced_by, ip, client_identity, revoked_ip,
           revoked_client_identity
    FROM refresh_tokens
"#;

/// MySQL implementation of TokenRepository
pub struct MySqlTokenRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlTokenRepository {
    /// Create a new MySQL token repository
    ///
    /// # Arguments
    /// * `pool` - MySQL connection pool from SQLx
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert database row to a RefreshTokenRecord
    fn row_to_record(row: &sqlx::mysql::MySqlRow) -> Result<RefreshTokenRecord, DomainError> {
        let id: String = row.try_get("id").map_err(|e| decode_error("id", e))?;
        let user_id: String = row.try_get("user_id").map_err(|e| decode_error("user_id", e))?;
        let revoked_reason: Option<String> = row
            .try_get("revoked_reason")
            .map_err(|e| decode_error("revoked_reason", e))?;
        let replaced_by: Option<String> = row
            .try_get("replaced_by")
            .map_err(|e| decode_error("replaced_by", e))?;
        let revoked_at: Option<DateTime<Utc>> = row
            .try_get("revoked_at")
            .map_err(|e| decode_error("revoked_at", e))?;

        let revoked_ip: Option<String> = row
            .try_get("revoked_ip")
            .map_err(|e| decode_error("revoked_ip", e))?;
        let revoked_client_identity: Option<String> = row
            .try_get("revoked_client_identity")
            .map_err(|e| decode_error("revoked_client_identity", e))?;
        let revocation_metadata = revoked_at.map(|_| RequestMetadata {
            ip: revoked_ip,
            client_identity: revoked_client_identity,
        });

        Ok(RefreshTokenRecord {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            credential_digest: row
                .try_get("credential_digest")
                .map_err(|e| decode_error("credential_digest", e))?,
            issued_at: row
                .try_get::<DateTime<Utc>, _>("issued_at")
                .map_err(|e| decode_error("issued_at", e))?,
            expires_at: row
                .try_get::<DateTime<Utc>, _>("expires_at")
                .map_err(|e| decode_error("expires_at", e))?,
            revoked_at,
            revoked_reason: revoked_reason
                .map(|reason| {
                    reason
                        .parse::<RevocationReason>()
                        .map_err(|message| DomainError::Internal { message })
                })
                .transpose()?,
            replaced_by: replaced_by.as_deref().map(parse_uuid).transpose()?,
            metadata: RequestMetadata {
                ip: row.try_get("ip").map_err(|e| decode_error("ip", e))?,
                client_identity: row
                    .try_get("client_identity")
                    .map_err(|e| decode_error("client_identity", e))?,
            },
            revocation_metadata,
        })
    }
}

fn decode_error(column: &str, e: sqlx::Error) -> DomainError {
    DomainError::Internal {
        message: format!("Failed to get {}: {}", column, e),
    }
}

fn parse_uuid(value: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(value).map_err(|e| DomainError::Internal {
        message: format!("Invalid UUID '{}': {}", value, e),
    })
}

fn storage_error(e: sqlx::Error) -> DomainError {
    tracing::error!("Refresh token query failed: {}", e);
    InfrastructureError::Database(e).into()
}

#[async_trait]
impl TokenRepository for MySqlTokenRepository {
    async fn insert(&self, record: RefreshTokenRecord) -> Result<RefreshTokenRecord, DomainError> {
        let query = r#"
            INSERT INTO refresh_tokens (
                id, user_id, credential_digest, issued_at, expires_at,
                ip, client_identity
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#;

        let result = sqlx::query(query)
            .bind(record.id.to_string())
            .bind(record.user_id.to_string())
            .bind(&record.credential_digest)
            .bind(record.issued_at)
            .bind(record.expires_at)
            .bind(&record.metadata.ip)
            .bind(&record.metadata.client_identity)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(record),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(TokenError::DigestCollision.into())
            }
            Err(e) => Err(storage_error(e)),
        }
    }

    async fn find_active_by_digest(
        &self,
        credential_digest: &str,
    ) -> Result<Option<RefreshTokenRecord>, DomainError> {
        let query = format!(
            "{} WHERE credential_digest = ? AND revoked_at IS NULL AND expires_at > ? LIMIT 1",
            SELECT_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(credential_digest)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshTokenRecord>, DomainError> {
        let query = format!("{} WHERE id = ? LIMIT 1", SELECT_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn mark_revoked_if_active(
        &self,
        id: Uuid,
        reason: RevocationReason,
        metadata: &RequestMetadata,
    ) -> Result<bool, DomainError> {
        let query = r#"
            UPDATE refresh_tokens
            SET revoked_at = ?, revoked_reason = ?, revoked_ip = ?, revoked_client_identity = ?
            WHERE id = ? AND revoked_at IS NULL AND expires_at > ?
        "#;

        let now = Utc::now();
        let result = sqlx::query(query)
            .bind(now)
            .bind(reason.as_str())
            .bind(&metadata.ip)
            .bind(&metadata.client_identity)
            .bind(id.to_string())
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_replaced_by(&self, id: Uuid, descendant_id: Uuid) -> Result<(), DomainError> {
        let query = r#"
            UPDATE refresh_tokens
            SET replaced_by = ?
            WHERE id = ? AND replaced_by IS NULL
        "#;

        let result = sqlx::query(query)
            .bind(descendant_id.to_string())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        if result.rows_affected() == 1 {
            Ok(())
        } else {
            Err(DomainError::Internal {
                message: format!("Refresh token {} is missing or already has a descendant", id),
            })
        }
    }

    async fn revoke_all_active_for_user(
        &self,
        user_id: Uuid,
        reason: RevocationReason,
    ) -> Result<usize, DomainError> {
        let query = r#"
            UPDATE refresh_tokens
            SET revoked_at = ?, revoked_reason = ?
            WHERE user_id = ? AND revoked_at IS NULL AND expires_at > ?
        "#;

        let now = Utc::now();
        let result = sqlx::query(query)
            .bind(now)
            .bind(reason.as_str())
            .bind(user_id.to_string())
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(result.rows_affected() as usize)
    }

    async fn delete_expired(&self, older_than: DateTime<Utc>) -> Result<usize, DomainError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < ?")
            .bind(older_than)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(result.rows_affected() as usize)
    }
}
