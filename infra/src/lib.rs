//! # Infrastructure Layer
//!
//! Concrete storage engines for LoanDesk refresh tokens. The core crate
//! defines the `TokenRepository` contract; this crate fulfils it against
//! real stores.
//!
//! ## Architecture
//!
//! - **Database**: MySQL connection pool, schema migration and the
//!   relational token repository (SQLx)
//! - **Cache**: Redis client and the document-style token repository
//!
//! ## Features
//!
//! - `mysql`: Enable MySQL database support (default)
//! - `redis-store`: Enable the Redis token store (default)

use ld_core::errors::DomainError;

/// Database module - MySQL implementations using SQLx
#[cfg(feature = "mysql")]
pub mod database;

/// Cache module - Redis client and token store
#[cfg(feature = "redis-store")]
pub mod cache;

/// Configuration re-exported from the shared crate
pub mod config {
    pub use ld_shared::config::{CacheConfig, DatabaseConfig};
}

#[cfg(feature = "mysql")]
pub use database::{DatabasePool, MySqlTokenRepository};

#[cfg(feature = "redis-store")]
pub use cache::{RedisClient, RedisTokenRepository};

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection or query error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Redis error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<InfrastructureError> for DomainError {
    fn from(error: InfrastructureError) -> Self {
        match error {
            InfrastructureError::Config(message) => DomainError::Internal { message },
            other => DomainError::StorageUnavailable {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_storage_unavailable() {
        let error: DomainError = InfrastructureError::Database(sqlx::Error::PoolTimedOut).into();
        assert!(error.is_storage_unavailable());

        let redis_error = redis::RedisError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "Connection refused",
        ));
        let error: DomainError = InfrastructureError::Cache(redis_error).into();
        assert!(error.is_storage_unavailable());
    }

    #[test]
    fn test_config_error_is_internal() {
        let error: DomainError = InfrastructureError::Config("bad url".to_string()).into();
        assert!(matches!(error, DomainError::Internal { .. }));
    }
}
