//! Token service module for refresh-token management
//!
//! This module handles every refresh-token operation:
//! - Credential generation and digesting
//! - Issuance of new records
//! - Single-use rotation
//! - Single and bulk revocation
//! - Background cleanup of long-expired records

mod cleanup;
mod config;
pub mod credential;
mod expiry;
mod issuer;
mod revocation;
mod rotation;
mod service;

#[cfg(test)]
mod tests;

pub use cleanup::{CleanupResult, TokenCleanupConfig, TokenCleanupService};
pub use config::TokenServiceConfig;
pub use expiry::ExpiryPolicy;
pub use issuer::{IssuedToken, TokenIssuer};
pub use revocation::RevocationManager;
pub use rotation::{RotatedToken, RotationCoordinator};
pub use service::TokenService;
