//! Configuration for the token service

use ld_shared::config::RefreshTokenConfig;

/// Default refresh token lifetime: seven days
pub const DEFAULT_REFRESH_TOKEN_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Configuration for the token service
#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    /// Refresh token lifetime in seconds
    pub refresh_token_ttl_seconds: i64,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self {
            refresh_token_ttl_seconds: DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
        }
    }
}

impl TokenServiceConfig {
    pub fn with_ttl_seconds(ttl_seconds: i64) -> Self {
        Self {
            refresh_token_ttl_seconds: ttl_seconds,
        }
    }
}

impl From<&RefreshTokenConfig> for TokenServiceConfig {
    fn from(config: &RefreshTokenConfig) -> Self {
        Self {
            refresh_token_ttl_seconds: config.ttl_seconds,
        }
    }
}
