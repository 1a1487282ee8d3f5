//! Invitation token generation and digesting.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Random bytes per token (256 bits).
const TOKEN_BYTES: usize = 32;

/// Generates a cryptographically secure random token, hex encoded.
pub fn generate() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::thread_rng().r#gen();
    hex::encode(bytes)
}

/// SHA-256 hex digest of a token. Only digests are persisted.
pub fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
