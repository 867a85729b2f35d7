use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

/// Logical key holding the JSON array of quote records.
pub const QUOTES_KEY: &str = "quotes";
/// Logical key holding the JSON identity of the signed-in user.
pub const SESSION_KEY: &str = "session";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredState {
    pub value: String,
    pub revision: u64,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage backend failure: {0}")]
    Backend(String),
    #[error("stored revision for `{key}` is out of range")]
    Revision { key: String },
}

/// Durable client-side storage of raw JSON values keyed by logical name.
///
/// Every write bumps the key's revision. `store` overwrites unconditionally;
/// `compare_and_swap` writes only if the current revision is still `expected`
/// (`None` meaning the key must not exist yet) and returns the new revision,
/// or `None` when another writer got there first.
#[async_trait]
pub trait StateStorage: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<StoredState>, StorageError>;

    async fn store(&self, key: &str, value: &str) -> Result<u64, StorageError>;

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<u64>,
        value: &str,
    ) -> Result<Option<u64>, StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Default)]
pub struct InMemoryStateStorage {
    entries: RwLock<HashMap<String, StoredState>>,
}

#[async_trait]
impl StateStorage for InMemoryStateStorage {
    async fn load(&self, key: &str) -> Result<Option<StoredState>, StorageError> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn store(&self, key: &str, value: &str) -> Result<u64, StorageError> {
        let mut entries = self.entries.write().await;
        let revision = entries.get(key).map(|state| state.revision + 1).unwrap_or(1);
        entries.insert(key.to_owned(), StoredState { value: value.to_owned(), revision });
        Ok(revision)
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<u64>,
        value: &str,
    ) -> Result<Option<u64>, StorageError> {
        let mut entries = self.entries.write().await;
        let current = entries.get(key).map(|state| state.revision);
        if current != expected {
            return Ok(None);
        }

        let revision = current.map(|revision| revision + 1).unwrap_or(1);
        entries.insert(key.to_owned(), StoredState { value: value.to_owned(), revision });
        Ok(Some(revision))
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemoryStateStorage, StateStorage, QUOTES_KEY};

    #[tokio::test]
    async fn store_bumps_revision_on_every_write() {
        let storage = InMemoryStateStorage::default();

        assert_eq!(storage.load(QUOTES_KEY).await.expect("load"), None);
        assert_eq!(storage.store(QUOTES_KEY, "[]").await.expect("first write"), 1);
        assert_eq!(storage.store(QUOTES_KEY, "[1]").await.expect("second write"), 2);

        let state = storage.load(QUOTES_KEY).await.expect("load").expect("present");
        assert_eq!(state.value, "[1]");
        assert_eq!(state.revision, 2);
    }

    #[tokio::test]
    async fn compare_and_swap_rejects_stale_revision() {
        let storage = InMemoryStateStorage::default();

        assert_eq!(storage.compare_and_swap(QUOTES_KEY, None, "[]").await.expect("cas"), Some(1));
        assert_eq!(storage.compare_and_swap(QUOTES_KEY, None, "[2]").await.expect("cas"), None);
        assert_eq!(
            storage.compare_and_swap(QUOTES_KEY, Some(1), "[3]").await.expect("cas"),
            Some(2)
        );
        assert_eq!(storage.compare_and_swap(QUOTES_KEY, Some(1), "[4]").await.expect("cas"), None);

        let state = storage.load(QUOTES_KEY).await.expect("load").expect("present");
        assert_eq!(state.value, "[3]");
    }

    #[tokio::test]
    async fn remove_clears_key() {
        let storage = InMemoryStateStorage::default();
        storage.store("session", "{}").await.expect("write");
        storage.remove("session").await.expect("remove");

        assert_eq!(storage.load("session").await.expect("load"), None);
    }
}
