//! Business services containing the refresh-token lifecycle.

pub mod token;

pub use token::{
    CleanupResult, ExpiryPolicy, IssuedToken, RevocationManager, RotatedToken,
    RotationCoordinator, TokenCleanupConfig, TokenCleanupService, TokenIssuer, TokenService,
    TokenServiceConfig,
};
