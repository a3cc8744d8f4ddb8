//! Password hashing and verification using HMAC-SHA256 with a server key.
//!
//! The hash is only as strong as the secrecy of the key: anyone holding
//! both a leaked hash and the key can run a dictionary attack.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Keyed password hasher.
#[derive(Clone)]
pub struct PasswordHasher {
    secret: Vec<u8>,
}

impl PasswordHasher {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            secret: secret.to_vec(),
        }
    }

    /// Lowercase hex HMAC-SHA256 of `password`.
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        mac.update(password.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Verify a password against a stored hash in constant time.
    pub fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, AuthError> {
        let computed = self.hash(password)?;
        Ok(computed.as_bytes().ct_eq(stored_hash.as_bytes()).into())
    }
}

impl fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("secret", &"<redacted>")
            .finish()
    }
}
