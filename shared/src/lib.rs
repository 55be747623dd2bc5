//! Shared configuration and common types for the LoanDesk server
//!
//! This crate provides functionality used across all server modules:
//! - Configuration types loaded from the environment
//! - The error response envelope and error codes returned by the API

pub mod config;
pub mod errors;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, Environment, LogFormat, LoggingConfig,
    DatabaseConfig, CacheConfig, ServerConfig,
    AuthConfig, JwtConfig, RefreshTokenConfig, TokenStoreBackend,
};
pub use errors::{ErrorResponse, error_codes};
