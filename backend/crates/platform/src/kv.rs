//! Durable Key-Value Storage
//!
//! Plain string keys, JSON text values. Rate windows and persisted cache
//! entries both live here. The PostgreSQL implementation is in the
//! `thought` crate's infra layer; [`MemoryKeyValueStore`] serves development
//! and tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

/// Storage backend failure
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Storage lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Backend(Box::new(err))
    }
}

/// Trait for key-value storage backends
#[trait_variant::make(KeyValueStore: Send)]
pub trait LocalKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Insert or overwrite
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// In-process store; contents vanish with the process
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{KeyValueStore, StoreError};

    /// Store whose every operation fails
    #[derive(Debug, Default)]
    pub struct BrokenStore;

    fn broken() -> StoreError {
        StoreError::backend(std::io::Error::other("store offline"))
    }

    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(broken())
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(broken())
        }

        async fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(broken())
        }

        async fn keys_with_prefix(&self, _prefix: &str) -> Result<Vec<String>, StoreError> {
            Err(broken())
        }
    }
}
