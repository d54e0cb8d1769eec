//! Credential verifier: sign-up validation and uniqueness, sign-in checks.
//!
//! Flow Overview:
//! 1) Sign-up trims and checks mandatory fields, pre-checks the id, hashes the
//!    secret off the async workers, then relies on the store's atomic
//!    insert-if-absent as the final word on uniqueness.
//! 2) Sign-in resolves the id and verifies the secret. Unknown ids are checked
//!    against a dummy hash so both failure paths do the same work and return
//!    the same error.

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{
    error::AuthError,
    password::CredentialHasher,
    storage::{CredentialStore, SignupOutcome},
    types::{Identity, IdentityRecord, NewIdentity},
    utils::normalize_field,
};

// Verified against when the id is unknown; never matches a real secret.
const DUMMY_SECRET: &str = "holdem-auth-dummy-credential";

pub struct CredentialVerifier {
    store: Arc<dyn CredentialStore>,
    hasher: CredentialHasher,
    dummy_hash: SecretString,
}

impl CredentialVerifier {
    /// # Errors
    /// Returns an error if the dummy hash cannot be computed.
    pub fn new(store: Arc<dyn CredentialStore>, hasher: CredentialHasher) -> Result<Self> {
        let dummy_hash = hasher
            .hash(&SecretString::from(DUMMY_SECRET.to_string()))
            .context("failed to prepare dummy credential hash")?;
        Ok(Self {
            store,
            hasher,
            dummy_hash,
        })
    }

    /// Register a new identity.
    ///
    /// # Errors
    /// - [`AuthError::Validation`] when id, name, or secret is empty.
    /// - [`AuthError::Conflict`] when the id is already registered.
    /// - [`AuthError::Internal`] on store or hashing failures.
    #[instrument(skip(self, candidate), fields(id = %candidate.id.trim()))]
    pub async fn sign_up(&self, candidate: NewIdentity) -> Result<Identity, AuthError> {
        let id = normalize_field(&candidate.id);
        let name = normalize_field(&candidate.name);
        if id.is_empty() || name.is_empty() || candidate.secret.expose_secret().is_empty() {
            return Err(AuthError::Validation);
        }

        // Cheap early exit; the insert below is what actually guards uniqueness.
        if self.store.find_by_id(&id).await?.is_some() {
            debug!("Sign-up rejected, id already registered");
            return Err(AuthError::Conflict);
        }

        let credential_hash = self.hash_secret(candidate.secret).await?;
        let record = IdentityRecord {
            id,
            display_name: name,
            credential_hash,
            date_of_birth: candidate.date_of_birth,
        };
        let identity = record.identity();

        match self.store.insert_if_absent(record).await? {
            SignupOutcome::Created => {
                debug!("Sign-up stored");
                Ok(identity)
            }
            SignupOutcome::Conflict => {
                debug!("Sign-up lost a concurrent registration race");
                Err(AuthError::Conflict)
            }
        }
    }

    /// Check credentials and return the identity they belong to.
    ///
    /// # Errors
    /// - [`AuthError::Authentication`] for an unknown id or a wrong secret.
    /// - [`AuthError::Internal`] on store or hashing failures.
    #[instrument(skip(self, secret))]
    pub async fn sign_in(&self, id: &str, secret: &SecretString) -> Result<Identity, AuthError> {
        let id = normalize_field(id);
        if id.is_empty() || secret.expose_secret().is_empty() {
            return Err(AuthError::Authentication);
        }

        let record = self.store.find_by_id(&id).await?;
        let stored_hash = record
            .as_ref()
            .map_or_else(|| self.dummy_hash.clone(), |r| r.credential_hash.clone());

        let verified = self.verify_secret(secret.clone(), stored_hash).await?;
        match record {
            Some(record) if verified => Ok(record.identity()),
            _ => {
                debug!("Sign-in rejected");
                Err(AuthError::Authentication)
            }
        }
    }

    async fn hash_secret(&self, secret: SecretString) -> Result<SecretString> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&secret))
            .await
            .context("credential hashing task failed")?
    }

    async fn verify_secret(&self, secret: SecretString, stored_hash: SecretString) -> Result<bool> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&secret, &stored_hash))
            .await
            .context("credential verification task failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::storage::MemoryStore;
    use time::macros::date;

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    fn verifier() -> Result<(Arc<MemoryStore>, CredentialVerifier)> {
        let store = Arc::new(MemoryStore::new());
        let verifier = CredentialVerifier::new(store.clone(), CredentialHasher::with_params(8, 1, 1)?)?;
        Ok((store, verifier))
    }

    fn candidate(id: &str, pwd: &str, name: &str) -> NewIdentity {
        NewIdentity {
            id: id.to_string(),
            name: name.to_string(),
            secret: secret(pwd),
            date_of_birth: Some(date!(1993 - 07 - 15)),
        }
    }

    #[tokio::test]
    async fn sign_up_stores_hashed_record() -> Result<()> {
        let (store, verifier) = verifier()?;
        let identity = verifier
            .sign_up(candidate("myId", "myPass", "myName"))
            .await?;
        assert_eq!(identity.id, "myId");
        assert_eq!(identity.name, "myName");
        assert_eq!(identity.date_of_birth, Some(date!(1993 - 07 - 15)));

        let record = store.find_by_id("myId").await?.context("record missing")?;
        assert_ne!(record.credential_hash.expose_secret(), "myPass");
        assert!(record.credential_hash.expose_secret().starts_with("$argon2id$"));
        Ok(())
    }

    #[tokio::test]
    async fn sign_up_trims_fields() -> Result<()> {
        let (store, verifier) = verifier()?;
        let identity = verifier
            .sign_up(candidate("  bulbasaur  ", "Bulba", " Bulbasaur "))
            .await?;
        assert_eq!(identity.id, "bulbasaur");
        assert_eq!(identity.name, "Bulbasaur");
        assert!(store.find_by_id("bulbasaur").await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn sign_up_rejects_missing_fields_even_for_fresh_id() -> Result<()> {
        let (store, verifier) = verifier()?;
        for (id, pwd, name) in [
            ("", "pass", "nameForTest"),
            ("   ", "pass", "nameForTest"),
            ("fresh", "", "nameForTest"),
            ("fresh", "pass", ""),
        ] {
            let result = verifier.sign_up(candidate(id, pwd, name)).await;
            assert!(matches!(result, Err(AuthError::Validation)), "{id:?}/{name:?}");
        }
        assert!(store.is_empty().await);
        Ok(())
    }

    #[tokio::test]
    async fn sign_up_conflicts_regardless_of_other_fields() -> Result<()> {
        let (store, verifier) = verifier()?;
        verifier
            .sign_up(candidate("charmander@pokemon.com", "Charrr", "Charmander"))
            .await?;

        let result = verifier
            .sign_up(candidate("charmander@pokemon.com", "pass", "nameForTest"))
            .await;
        assert!(matches!(result, Err(AuthError::Conflict)));

        let record = store
            .find_by_id("charmander@pokemon.com")
            .await?
            .context("record missing")?;
        assert_eq!(record.display_name, "Charmander");
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_sign_ups_register_once() -> Result<()> {
        let (store, verifier) = verifier()?;
        let verifier = Arc::new(verifier);
        let mut handles = Vec::new();
        for n in 0..8 {
            let verifier = verifier.clone();
            handles.push(tokio::spawn(async move {
                verifier
                    .sign_up(candidate("mew@pokemon.com", "psychic", &format!("Mew {n}")))
                    .await
            }));
        }

        let mut created = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await? {
                Ok(_) => created += 1,
                Err(AuthError::Conflict) => conflicts += 1,
                Err(err) => return Err(anyhow::anyhow!("unexpected error: {err}")),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(conflicts, 7);
        assert_eq!(store.len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn sign_in_accepts_correct_secret() -> Result<()> {
        let (_store, verifier) = verifier()?;
        verifier
            .sign_up(candidate("charizard@pokemon.com", "Roarrr", "Charizard"))
            .await?;
        let identity = verifier
            .sign_in("charizard@pokemon.com", &secret("Roarrr"))
            .await?;
        assert_eq!(identity.name, "Charizard");
        Ok(())
    }

    #[tokio::test]
    async fn sign_in_failures_are_indistinguishable() -> Result<()> {
        let (_store, verifier) = verifier()?;
        verifier
            .sign_up(candidate("charmander@pokemon.com", "Charrr", "Charmander"))
            .await?;

        let unknown = verifier
            .sign_in("snorlax@pokemon.com", &secret("zZzZz"))
            .await;
        let wrong = verifier
            .sign_in("charmander@pokemon.com", &secret("Roarrr"))
            .await;

        let (Err(unknown), Err(wrong)) = (unknown, wrong) else {
            return Err(anyhow::anyhow!("sign-in unexpectedly succeeded"));
        };
        assert!(matches!(unknown, AuthError::Authentication));
        assert!(matches!(wrong, AuthError::Authentication));
        assert_eq!(unknown.message(), wrong.message());
        assert_eq!(unknown.status(), wrong.status());
        Ok(())
    }

    #[tokio::test]
    async fn sign_in_fails_closed_on_empty_stored_hash() -> Result<()> {
        let (store, verifier) = verifier()?;
        store
            .save(IdentityRecord {
                id: "ditto".to_string(),
                display_name: "Ditto".to_string(),
                credential_hash: secret(""),
                date_of_birth: None,
            })
            .await?;

        assert!(matches!(
            verifier.sign_in("ditto", &secret("anything")).await,
            Err(AuthError::Authentication)
        ));
        assert!(matches!(
            verifier.sign_in("ditto", &secret("")).await,
            Err(AuthError::Authentication)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn sign_in_does_not_accept_the_dummy_secret() -> Result<()> {
        let (_store, verifier) = verifier()?;
        let result = verifier.sign_in("nobody", &secret(DUMMY_SECRET)).await;
        assert!(matches!(result, Err(AuthError::Authentication)));
        Ok(())
    }
}
