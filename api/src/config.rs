//! Startup validation of the loaded configuration

use ld_shared::config::{AppConfig, TokenStoreBackend, MAX_REFRESH_TOKEN_TTL_SECONDS};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set to a non-default value in production")]
    DefaultJwtSecret,

    #[error("REFRESH_TOKEN_TTL_SECONDS must be between 1 and 315360000, got {0}")]
    RefreshTtlOutOfRange(i64),

    #[error("The in-memory refresh token store cannot be used in production")]
    VolatileStoreInProduction,
}

/// Reject configurations the server must not start with
pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    let ttl_seconds = config.auth.refresh.ttl_seconds;
    if ttl_seconds <= 0 || ttl_seconds > MAX_REFRESH_TOKEN_TTL_SECONDS {
        return Err(ConfigError::RefreshTtlOutOfRange(ttl_seconds));
    }

    if config.is_production() {
        if config.auth.jwt.is_using_default_secret() {
            return Err(ConfigError::DefaultJwtSecret);
        }
        if config.auth.refresh.store == TokenStoreBackend::Memory {
            return Err(ConfigError::VolatileStoreInProduction);
        }
    }

    Ok(())
}
