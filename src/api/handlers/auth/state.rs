//! Auth state and configuration shared by the handlers and the request gate.

use anyhow::{Context, Result};
use std::sync::Arc;

use super::{
    credentials::CredentialVerifier,
    password::CredentialHasher,
    storage::CredentialStore,
    token::{TokenIssuer, TokenKey, TokenValidator},
};

pub(crate) const DEFAULT_TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;
pub(crate) const DEFAULT_TOKEN_ISSUER: &str = "holdem-auth";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    issuer: String,
    token_ttl_seconds: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            issuer: DEFAULT_TOKEN_ISSUER.to_string(),
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: String) -> Self {
        self.issuer = issuer;
        self
    }

    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[must_use]
    pub fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl_seconds
    }
}

pub struct AuthState {
    config: AuthConfig,
    store: Arc<dyn CredentialStore>,
    verifier: CredentialVerifier,
    issuer: TokenIssuer,
    validator: TokenValidator,
}

impl AuthState {
    /// Wire the store, hasher, and signing key into one shared state.
    ///
    /// # Errors
    /// Returns an error if the TTL is not positive or the dummy hash cannot be computed.
    pub fn new(
        config: AuthConfig,
        store: Arc<dyn CredentialStore>,
        hasher: CredentialHasher,
        key: TokenKey,
    ) -> Result<Self> {
        let key = Arc::new(key);
        let issuer = TokenIssuer::new(
            key.clone(),
            config.issuer().to_string(),
            config.token_ttl_seconds(),
        )
        .context("invalid token configuration")?;
        let validator = TokenValidator::new(key, config.issuer().to_string());
        let verifier = CredentialVerifier::new(store.clone(), hasher)?;

        Ok(Self {
            config,
            store,
            verifier,
            issuer,
            validator,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    pub fn verifier(&self) -> &CredentialVerifier {
        &self.verifier
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    pub fn validator(&self) -> &TokenValidator {
        &self.validator
    }
}
