//! Domain entities representing core business objects.

pub mod refresh_token;

pub use refresh_token::{
    digest_prefix, RefreshTokenRecord, RequestMetadata, RevocationReason, TokenState,
    DIGEST_LOG_PREFIX_LEN, MAX_CLIENT_IDENTITY_LEN, MAX_IP_LEN,
};
