//! # LoanDesk Core
//!
//! Core domain layer for session continuity in the LoanDesk backend.
//! This crate contains the refresh-token record, the storage interface every
//! persistence engine implements, and the services that issue, rotate, revoke
//! and expire refresh tokens. Nothing here depends on a concrete database.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::entities::*;
pub use errors::*;
pub use repositories::{InMemoryTokenRepository, TokenRepository};
pub use services::*;
