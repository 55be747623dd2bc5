//! Refresh credential generation and digesting

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

pub use crate::domain::entities::digest_prefix;

/// Entropy of a refresh credential in bytes
pub const CREDENTIAL_BYTES: usize = 32;

/// Length of an encoded credential
pub const CREDENTIAL_LENGTH: usize = 43;

/// Generate a fresh credential from the operating system CSPRNG.
///
/// The result is URL-safe base64 without padding. It must be handed to the
/// client and then forgotten; only its digest is ever stored.
pub fn generate_credential() -> String {
    let mut bytes = [0u8; CREDENTIAL_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 of the credential as lowercase hex
pub fn digest_credential(credential: &str) -> String {
    hex::encode(Sha256::digest(credential.as_bytes()))
}
