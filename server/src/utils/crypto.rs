//! Cryptographic utility functions

use anyhow::{Result, bail};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::core::constants::CURSOR_SECRET_MIN_LEN;

/// Generate a cryptographically secure random key
pub fn generate_key(len: usize) -> Vec<u8> {
    let mut key = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut key);
    key
}

/// Generate a 256-bit (32 byte) signing key
pub fn generate_signing_key() -> Vec<u8> {
    generate_key(32)
}

/// Decode a hex-encoded signing secret, enforcing the minimum length
pub fn decode_signing_secret(hex_secret: &str) -> Result<Vec<u8>> {
    let key = hex::decode(hex_secret.trim())
        .map_err(|e| anyhow::anyhow!("Signing secret is not valid hex: {}", e))?;
    if key.len() < CURSOR_SECRET_MIN_LEN {
        bail!(
            "Signing secret must be at least {} bytes ({} hex chars), got {}",
            CURSOR_SECRET_MIN_LEN,
            CURSOR_SECRET_MIN_LEN * 2,
            key.len()
        );
    }
    Ok(key)
}

/// Calculate SHA256 hash and return as hex string
pub fn sha256_hex(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    hex::encode(hasher.finalize())
}
