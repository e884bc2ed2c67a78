use super::{KeyValueStore, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// Process-local key-value store.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}
