//! Domain-specific error types and error handling.

mod types;

#[cfg(test)]
mod tests;

pub use types::TokenError;

use thiserror::Error;

/// Core domain errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The store could not complete an operation. Never retried inside
    /// the token services; retry policy belongs to the caller.
    #[error("Storage unavailable: {message}")]
    StorageUnavailable { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl DomainError {
    /// Shorthand for a storage failure
    pub fn storage(message: impl Into<String>) -> Self {
        DomainError::StorageUnavailable { message: message.into() }
    }

    /// Shorthand for an internal failure
    pub fn internal(message: impl Into<String>) -> Self {
        DomainError::Internal { message: message.into() }
    }

    /// `true` for the single outcome every refresh failure collapses into
    pub fn is_invalid_refresh_token(&self) -> bool {
        matches!(self, DomainError::Token(TokenError::InvalidRefreshToken))
    }

    /// `true` when the failure is transient and the caller may retry
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, DomainError::StorageUnavailable { .. })
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
