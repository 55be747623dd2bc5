//! Redis implementation of the TokenRepository trait.
//!
//! Layout, before the configured key prefix:
//! - `refresh_token:{id}` - hash holding one record, timestamps as epoch ms
//! - `refresh_token:digest:{digest}` - record id for a credential digest
//! - `refresh_token:user:{user_id}` - set of record ids owned by a user
//!
//! Record and digest keys carry a native expiry at the record's
//! `expires_at`, so Redis reclaims expired records without a sweep.
//! Conditional transitions run as Lua scripts and are therefore atomic.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use redis::{AsyncCommands, Script};
use std::collections::HashMap;
use tracing::{debug, error};
use uuid::Uuid;

use ld_core::domain::entities::{RefreshTokenRecord, RequestMetadata, RevocationReason};
use ld_core::errors::{DomainError, TokenError};
use ld_core::repositories::TokenRepository;

use super::redis_client::RedisClient;
use crate::InfrastructureError;

/// KEYS: record, digest index, user set.
/// ARGV: id, user_id, digest, issued_at, expires_at, now, ip, client_identity.
/// Returns 0 when the digest is already taken.
const INSERT_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[2]) == 1 then
    return 0
end
redis.call('HSET', KEYS[1],
    'id', ARGV[1],
    'user_id', ARGV[2],
    'credential_digest', ARGV[3],
    'issued_at', ARGV[4],
    'expires_at', ARGV[5])
if ARGV[7] ~= '' then
    redis.call('HSET', KEYS[1], 'ip', ARGV[7])
end
if ARGV[8] ~= '' then
    redis.call('HSET', KEYS[1], 'client_identity', ARGV[8])
end
redis.call('SET', KEYS[2], ARGV[1])
redis.call('PEXPIREAT', KEYS[1], ARGV[5])
redis.call('PEXPIREAT', KEYS[2], ARGV[5])
redis.call('SADD', KEYS[3], ARGV[1])
local remaining = tonumber(ARGV[5]) - tonumber(ARGV[6])
if redis.call('PTTL', KEYS[3]) < remaining then
    redis.call('PEXPIRE', KEYS[3], remaining)
end
return 1
"#;

/// KEYS: record.
/// ARGV: now, reason, ip, client_identity.
/// Returns 1 only if this call moved the record out of the active state.
const MARK_REVOKED_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return 0
end
if redis.call('HEXISTS', KEYS[1], 'revoked_at') == 1 then
    return 0
end
local expires_at = tonumber(redis.call('HGET', KEYS[1], 'expires_at'))
if expires_at == nil or tonumber(ARGV[1]) >= expires_at then
    return 0
end
redis.call('HSET', KEYS[1], 'revoked_at', ARGV[1], 'revoked_reason', ARGV[2])
if ARGV[3] ~= '' then
    redis.call('HSET', KEYS[1], 'revoked_ip', ARGV[3])
end
if ARGV[4] ~= '' then
    redis.call('HSET', KEYS[1], 'revoked_client_identity', ARGV[4])
end
return 1
"#;

/// KEYS: record. ARGV: descendant id.
/// Returns -1 for a missing record, 0 if a descendant is already set.
const SET_REPLACED_BY_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return -1
end
return redis.call('HSETNX', KEYS[1], 'replaced_by', ARGV[1])
"#;

/// Redis implementation of TokenRepository
pub struct RedisTokenRepository {
    client: RedisClient,
    insert_script: Script,
    mark_revoked_script: Script,
    set_replaced_by_script: Script,
}

impl RedisTokenRepository {
    /// Create a new Redis token repository
    ///
    /// # Arguments
    /// * `client` - Connected Redis client; its key prefix is honoured
    pub fn new(client: RedisClient) -> Self {
        Self {
            client,
            insert_script: Script::new(INSERT_SCRIPT),
            mark_revoked_script: Script::new(MARK_REVOKED_SCRIPT),
            set_replaced_by_script: Script::new(SET_REPLACED_BY_SCRIPT),
        }
    }

    fn record_key(&self, id: Uuid) -> String {
        self.client.key(&format!("refresh_token:{}", id))
    }

    fn digest_key(&self, digest: &str) -> String {
        self.client.key(&format!("refresh_token:digest:{}", digest))
    }

    fn user_key(&self, user_id: Uuid) -> String {
        self.client.key(&format!("refresh_token:user:{}", user_id))
    }

    async fn load(&self, id: Uuid) -> Result<Option<RefreshTokenRecord>, DomainError> {
        let mut conn = self.client.connection();
        let fields: HashMap<String, String> = conn
            .hgetall(self.record_key(id))
            .await
            .map_err(storage_error)?;

        if fields.is_empty() {
            return Ok(None);
        }
        record_from_hash(&fields).map(Some)
    }

    async fn mark_revoked(
        &self,
        id: Uuid,
        reason: RevocationReason,
        metadata: &RequestMetadata,
    ) -> Result<bool, DomainError> {
        let mut conn = self.client.connection();
        let transitioned: i64 = self
            .mark_revoked_script
            .key(self.record_key(id))
            .arg(Utc::now().timestamp_millis())
            .arg(reason.as_str())
            .arg(metadata.ip.as_deref().unwrap_or_default())
            .arg(metadata.client_identity.as_deref().unwrap_or_default())
            .invoke_async(&mut conn)
            .await
            .map_err(storage_error)?;

        Ok(transitioned == 1)
    }
}

fn storage_error(e: redis::RedisError) -> DomainError {
    error!("Refresh token Redis operation failed: {}", e);
    InfrastructureError::Cache(e).into()
}

fn field<'a>(fields: &'a HashMap<String, String>, name: &str) -> Result<&'a str, DomainError> {
    fields
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| DomainError::Internal {
            message: format!("Refresh token hash is missing '{}'", name),
        })
}

fn parse_uuid(value: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(value).map_err(|e| DomainError::Internal {
        message: format!("Invalid UUID '{}': {}", value, e),
    })
}

fn parse_millis(value: &str) -> Result<DateTime<Utc>, DomainError> {
    value
        .parse::<i64>()
        .ok()
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
        .ok_or_else(|| DomainError::Internal {
            message: format!("Invalid timestamp '{}'", value),
        })
}

/// Rebuild a record from its Redis hash
fn record_from_hash(fields: &HashMap<String, String>) -> Result<RefreshTokenRecord, DomainError> {
    let revoked_at = fields.get("revoked_at").map(|v| parse_millis(v)).transpose()?;
    let revocation_metadata = revoked_at.map(|_| RequestMetadata {
        ip: fields.get("revoked_ip").cloned(),
        client_identity: fields.get("revoked_client_identity").cloned(),
    });

    Ok(RefreshTokenRecord {
        id: parse_uuid(field(fields, "id")?)?,
        user_id: parse_uuid(field(fields, "user_id")?)?,
        credential_digest: field(fields, "credential_digest")?.to_string(),
        issued_at: parse_millis(field(fields, "issued_at")?)?,
        expires_at: parse_millis(field(fields, "expires_at")?)?,
        revoked_at,
        revoked_reason: fields
            .get("revoked_reason")
            .map(|reason| {
                reason
                    .parse::<RevocationReason>()
                    .map_err(|message| DomainError::Internal { message })
            })
            .transpose()?,
        replaced_by: fields
            .get("replaced_by")
            .map(|id| parse_uuid(id))
            .transpose()?,
        metadata: RequestMetadata {
            ip: fields.get("ip").cloned(),
            client_identity: fields.get("client_identity").cloned(),
        },
        revocation_metadata,
    })
}

#[async_trait]
impl TokenRepository for RedisTokenRepository {
    async fn insert(&self, record: RefreshTokenRecord) -> Result<RefreshTokenRecord, DomainError> {
        let mut conn = self.client.connection();
        let inserted: i64 = self
            .insert_script
            .key(self.record_key(record.id))
            .key(self.digest_key(&record.credential_digest))
            .key(self.user_key(record.user_id))
            .arg(record.id.to_string())
            .arg(record.user_id.to_string())
            .arg(&record.credential_digest)
            .arg(record.issued_at.timestamp_millis())
            .arg(record.expires_at.timestamp_millis())
            .arg(Utc::now().timestamp_millis())
            .arg(record.metadata.ip.as_deref().unwrap_or_default())
            .arg(record.metadata.client_identity.as_deref().unwrap_or_default())
            .invoke_async(&mut conn)
            .await
            .map_err(storage_error)?;

        if inserted == 1 {
            Ok(record)
        } else {
            Err(TokenError::DigestCollision.into())
        }
    }

    async fn find_active_by_digest(
        &self,
        credential_digest: &str,
    ) -> Result<Option<RefreshTokenRecord>, DomainError> {
        let mut conn = self.client.connection();
        let id: Option<String> = conn
            .get(self.digest_key(credential_digest))
            .await
            .map_err(storage_error)?;

        let Some(id) = id else {
            return Ok(None);
        };

        let record = self.load(parse_uuid(&id)?).await?;
        Ok(record.filter(|record| record.is_active_at(Utc::now())))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshTokenRecord>, DomainError> {
        self.load(id).await
    }

    async fn mark_revoked_if_active(
        &self,
        id: Uuid,
        reason: RevocationReason,
        metadata: &RequestMetadata,
    ) -> Result<bool, DomainError> {
        self.mark_revoked(id, reason, metadata).await
    }

    async fn set_replaced_by(&self, id: Uuid, descendant_id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.client.connection();
        let outcome: i64 = self
            .set_replaced_by_script
            .key(self.record_key(id))
            .arg(descendant_id.to_string())
            .invoke_async(&mut conn)
            .await
            .map_err(storage_error)?;

        match outcome {
            1 => Ok(()),
            -1 => Err(DomainError::Internal {
                message: format!("Refresh token {} not found", id),
            }),
            _ => Err(DomainError::Internal {
                message: format!("Refresh token {} already has a descendant", id),
            }),
        }
    }

    async fn revoke_all_active_for_user(
        &self,
        user_id: Uuid,
        reason: RevocationReason,
    ) -> Result<usize, DomainError> {
        let user_key = self.user_key(user_id);
        let mut conn = self.client.connection();
        let members: Vec<String> = conn.smembers(&user_key).await.map_err(storage_error)?;

        let metadata = RequestMetadata::default();
        let mut revoked = 0;
        for member in members {
            let id = parse_uuid(&member)?;
            if self.mark_revoked(id, reason, &metadata).await? {
                revoked += 1;
                continue;
            }

            // Natively expired records leave a dangling id behind
            let exists: bool = conn.exists(self.record_key(id)).await.map_err(storage_error)?;
            if !exists {
                let _: () = conn.srem(&user_key, &member).await.map_err(storage_error)?;
            }
        }

        Ok(revoked)
    }

    async fn delete_expired(&self, _older_than: DateTime<Utc>) -> Result<usize, DomainError> {
        debug!("Redis refresh tokens expire natively; nothing to sweep");
        Ok(0)
    }
}
