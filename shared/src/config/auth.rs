//! Authentication configuration
//!
//! Two concerns live here: verifying the short-lived access tokens minted by
//! the authentication service, and the refresh-token lifecycle owned by the
//! token services in `ld_core`.

use serde::{Deserialize, Serialize};

use super::env_or;

/// Default secret used when `JWT_SECRET` is not set
const DEFAULT_JWT_SECRET: &str = "development-secret-please-change-in-production";

/// Longest accepted refresh token lifetime, ten years
pub const MAX_REFRESH_TOKEN_TTL_SECONDS: i64 = 10 * 365 * 86400;

/// Access-token verification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// Shared secret for HS256 verification
    pub secret: String,

    /// Expected issuer claim, if any
    #[serde(default)]
    pub issuer: Option<String>,

    /// Expected audience claim, if any
    #[serde(default)]
    pub audience: Option<String>,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::from(DEFAULT_JWT_SECRET),
            issuer: None,
            audience: None,
        }
    }
}

impl JwtConfig {
    /// Create a new JWT configuration with secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        Self {
            secret: std::env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string()),
            issuer: std::env::var("JWT_ISSUER").ok(),
            audience: std::env::var("JWT_AUDIENCE").ok(),
        }
    }

    /// Check if using default secret (security warning)
    pub fn is_using_default_secret(&self) -> bool {
        self.secret == DEFAULT_JWT_SECRET
    }
}

/// Persistence engine backing the refresh-token store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStoreBackend {
    /// Process-local store, for development and tests
    Memory,
    /// Relational store (MySQL)
    MySql,
    /// Document-style store with native key expiry (Redis)
    Redis,
}

impl Default for TokenStoreBackend {
    fn default() -> Self {
        TokenStoreBackend::Memory
    }
}

impl std::fmt::Display for TokenStoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenStoreBackend::Memory => write!(f, "memory"),
            TokenStoreBackend::MySql => write!(f, "mysql"),
            TokenStoreBackend::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for TokenStoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "in-memory" => Ok(TokenStoreBackend::Memory),
            "mysql" => Ok(TokenStoreBackend::MySql),
            "redis" => Ok(TokenStoreBackend::Redis),
            _ => Err(format!("Invalid token store backend: {}", s)),
        }
    }
}

/// Refresh-token lifecycle configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RefreshTokenConfig {
    /// Lifetime of an issued refresh token in seconds
    pub ttl_seconds: i64,

    /// Which engine stores the records
    #[serde(default)]
    pub store: TokenStoreBackend,

    /// Whether the periodic cleanup sweep runs
    #[serde(default = "default_cleanup_enabled")]
    pub cleanup_enabled: bool,

    /// How often the cleanup sweep runs, in seconds
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_seconds: u64,

    /// How long an expired record is kept before physical deletion, in seconds
    #[serde(default = "default_cleanup_grace_period")]
    pub cleanup_grace_period_seconds: i64,
}

impl Default for RefreshTokenConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 604800, // 7 days
            store: TokenStoreBackend::default(),
            cleanup_enabled: default_cleanup_enabled(),
            cleanup_interval_seconds: default_cleanup_interval(),
            cleanup_grace_period_seconds: default_cleanup_grace_period(),
        }
    }
}

impl RefreshTokenConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl_seconds: env_or("REFRESH_TOKEN_TTL_SECONDS", defaults.ttl_seconds),
            store: env_or("REFRESH_TOKEN_STORE", defaults.store),
            cleanup_enabled: env_or("TOKEN_CLEANUP_ENABLED", defaults.cleanup_enabled),
            cleanup_interval_seconds: env_or(
                "TOKEN_CLEANUP_INTERVAL_SECONDS",
                defaults.cleanup_interval_seconds,
            ),
            cleanup_grace_period_seconds: env_or(
                "TOKEN_CLEANUP_GRACE_PERIOD_SECONDS",
                defaults.cleanup_grace_period_seconds,
            ),
        }
    }

    /// Set refresh token lifetime in days
    pub fn with_ttl_days(mut self, days: i64) -> Self {
        self.ttl_seconds = days.saturating_mul(86400);
        self
    }

    /// Select the storage engine
    pub fn with_store(mut self, store: TokenStoreBackend) -> Self {
        self.store = store;
        self
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Access-token verification
    pub jwt: JwtConfig,

    /// Refresh-token lifecycle
    #[serde(default)]
    pub refresh: RefreshTokenConfig,
}

impl AuthConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self {
            jwt: JwtConfig::from_env(),
            refresh: RefreshTokenConfig::from_env(),
        }
    }

    /// Get JWT secret
    pub fn jwt_secret(&self) -> &str {
        &self.jwt.secret
    }

    /// Get refresh token lifetime in seconds
    pub fn refresh_token_ttl_seconds(&self) -> i64 {
        self.refresh.ttl_seconds
    }
}

fn default_cleanup_enabled() -> bool {
    true
}

fn default_cleanup_interval() -> u64 {
    3600 // hourly
}

fn default_cleanup_grace_period() -> i64 {
    86400 // 1 day
}
