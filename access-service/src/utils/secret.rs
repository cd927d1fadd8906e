use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::fmt;

/// A plaintext secret (password or raw API key).
///
/// `Debug` is redacted so the value cannot end up in a log line by accident.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}

/// PHC-formatted Argon2 hash of a [`Secret`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretHash(String);

impl SecretHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Hash a secret with Argon2id and a fresh random salt.
///
/// Fails only when the salt cannot be drawn or the hasher rejects its input.
pub fn hash_secret(secret: &Secret) -> Result<SecretHash, anyhow::Error> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(secret.expose().as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash secret: {}", e))?
        .to_string();

    Ok(SecretHash::new(hash))
}

/// Check a candidate secret against a stored hash.
///
/// A mismatch is `false`, not an error. A stored hash that does not parse is
/// logged and also treated as a mismatch.
pub fn verify_secret(candidate: &Secret, hash: &SecretHash) -> bool {
    let parsed = match PasswordHash::new(hash.as_str()) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "Stored secret hash is malformed");
            return false;
        }
    };

    Argon2::default()
        .verify_password(candidate.expose().as_bytes(), &parsed)
        .is_ok()
}
