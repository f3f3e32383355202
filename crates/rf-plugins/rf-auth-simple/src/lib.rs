//! # rf-auth-simple
//!
//! Argon2-based implementation of `AuthProvider`.
//! Handles password hashing and opaque session tokens.

use anyhow::anyhow;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::Engine;
use rf_core::traits::AuthProvider;
use sha2::{Digest, Sha256};

/// Raw entropy behind each session token.
const SESSION_TOKEN_BYTES: usize = 32;

#[derive(Default)]
pub struct SimpleAuthProvider {
    argon2: Argon2<'static>,
}

impl SimpleAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuthProvider for SimpleAuthProvider {
    /// Hashes with argon2id and a fresh random salt. Output is a PHC string.
    fn hash_password(&self, password: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("password hashing failed: {e}"))?;
        Ok(hash.to_string())
    }

    /// Verifies if a provided password matches a stored Argon2 hash.
    fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// 32 random bytes, URL-safe base64 without padding (43 chars).
    fn generate_session_token(&self) -> anyhow::Result<String> {
        let mut buf = [0u8; SESSION_TOKEN_BYTES];
        getrandom::getrandom(&mut buf).map_err(|e| anyhow!("OS RNG unavailable: {e}"))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf))
    }

    /// Hex SHA-256 of the token, so a leaked sessions table can't be replayed.
    fn digest_session_token(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }
}
