//! Credential store contract and the in-memory implementation.
//!
//! The store is a keyed map of identity records. It does not validate
//! anything; the credential verifier layers uniqueness and field checks on
//! top of [`CredentialStore::insert_if_absent`].

use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, hash_map::Entry};
use tokio::sync::RwLock;

use super::types::IdentityRecord;

/// Outcome when attempting to create a new identity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupOutcome {
    Created,
    Conflict,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert or overwrite a record.
    async fn save(&self, record: IdentityRecord) -> Result<()>;

    /// Insert a record only when its id is free. Atomic with respect to
    /// concurrent callers using the same id.
    async fn insert_if_absent(&self, record: IdentityRecord) -> Result<SignupOutcome>;

    async fn find_by_id(&self, id: &str) -> Result<Option<IdentityRecord>>;

    /// Remove a single record. Returns `false` when it did not exist.
    async fn delete(&self, id: &str) -> Result<bool>;

    async fn delete_all(&self) -> Result<()>;

    /// Reachability check reported by `/health`.
    async fn ping(&self) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, IdentityRecord>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn save(&self, record: IdentityRecord) -> Result<()> {
        self.records.write().await.insert(record.id.clone(), record);
        Ok(())
    }

    async fn insert_if_absent(&self, record: IdentityRecord) -> Result<SignupOutcome> {
        let mut records = self.records.write().await;
        match records.entry(record.id.clone()) {
            Entry::Occupied(_) => Ok(SignupOutcome::Conflict),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(SignupOutcome::Created)
            }
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<IdentityRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.records.write().await.remove(id).is_some())
    }

    async fn delete_all(&self) -> Result<()> {
        self.records.write().await.clear();
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
