//! Password hashing and verification (Argon2id, PHC string format).
//!
//! Plaintext passwords only ever live in the arguments of these functions;
//! nothing here logs or stores them.

use std::sync::OnceLock;

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("entropy source failed: {0}")]
    Entropy(String),

    #[error("hashing failed: {0}")]
    Hash(String),
}

/// Hash `plaintext` with a fresh 16-byte random salt.
///
/// Two calls with the same input produce different digests.
pub fn hash_password(plaintext: &str) -> Result<String, PasswordError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| PasswordError::Entropy(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordError::Hash(e.to_string()))?;
    let digest = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?
        .to_string();
    Ok(digest)
}

/// Check `plaintext` against a stored digest.
///
/// The Argon2 verifier compares in constant time. A digest that does not
/// parse as a PHC string never verifies.
pub fn verify_password(plaintext: &str, digest: &str) -> bool {
    match PasswordHash::new(digest) {
        Ok(parsed) => Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// A valid digest of a throwaway password.
///
/// Verifying against it costs the same as a real verification, which keeps
/// "unknown user" and "wrong password" indistinguishable by response time.
pub fn dummy_digest() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| hash_password("postgate-timing-equaliser").unwrap_or_default())
}
