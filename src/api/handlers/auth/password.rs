//! Argon2id hashing for stored credentials.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

/// Hashes secrets into PHC strings and verifies them in constant time.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default()),
        }
    }
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("algorithm", &"argon2id")
            .finish()
    }
}

impl CredentialHasher {
    /// Build a hasher with explicit cost parameters.
    ///
    /// # Errors
    /// Returns an error if the parameters are outside Argon2's accepted ranges.
    pub fn with_params(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|err| anyhow!("invalid argon2 parameters: {err}"))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a secret with a fresh random salt.
    ///
    /// # Errors
    /// Returns an error if hashing fails.
    pub fn hash(&self, secret: &SecretString) -> Result<SecretString> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(secret.expose_secret().as_bytes(), &salt)
            .map_err(|err| anyhow!("failed to hash credential: {err}"))?;
        Ok(SecretString::from(hash.to_string()))
    }

    /// Check a secret against a stored PHC string.
    ///
    /// Empty secrets and empty or unparseable hashes never verify.
    #[must_use]
    pub fn verify(&self, secret: &SecretString, stored_hash: &SecretString) -> bool {
        let secret = secret.expose_secret();
        let stored_hash = stored_hash.expose_secret();
        if secret.is_empty() || stored_hash.is_empty() {
            return false;
        }
        let parsed = match PasswordHash::new(stored_hash) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("Stored credential hash is unparseable: {err}");
                return false;
            }
        };
        self.argon2
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok()
    }
}
