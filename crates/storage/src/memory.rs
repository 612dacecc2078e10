//! In-memory storage backend.

use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{KeyValueStore, Result, StorageError, StoredValue};

/// Process-local store. State is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, StoredValue>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, StoredValue>>> {
        self.values
            .lock()
            .map_err(|_| StorageError::Other("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<StoredValue>> {
        Ok(self.lock()?.get(key).copied())
    }

    fn put(&self, key: &str, value: StoredValue) -> Result<()> {
        self.lock()?.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_use_defaults() {
        let store = MemoryStore::new();
        assert!(!store.get_bool("ExamTask_x", false).unwrap());
        assert!(store.get_bool("ExamTask_x", true).unwrap());
        assert_eq!(store.get_long("DisabledTo_x", 0).unwrap(), 0);
    }

    #[test]
    fn test_put_and_get() {
        let store = MemoryStore::new();
        store.put_bool("ConfirmationTask_ack", true).unwrap();
        store.put_long("Objectives_usage_started", 1_700_000_000_000).unwrap();

        assert!(store.get_bool("ConfirmationTask_ack", false).unwrap());
        assert_eq!(
            store.get_long("Objectives_usage_started", 0).unwrap(),
            1_700_000_000_000
        );
        assert_eq!(
            store.keys().unwrap(),
            vec!["ConfirmationTask_ack".to_string(), "Objectives_usage_started".to_string()]
        );
    }

    #[test]
    fn test_type_mismatch() {
        let store = MemoryStore::new();
        store.put_long("key", 5).unwrap();

        let err = store.get_bool("key", false).unwrap_err();
        assert!(matches!(err, StorageError::TypeMismatch { expected: "bool", .. }));
    }

    #[test]
    fn test_remove() {
        let store = MemoryStore::new();
        store.put_bool("key", true).unwrap();
        store.remove("key").unwrap();
        store.remove("key").unwrap();
        assert_eq!(store.get("key").unwrap(), None);
    }
}
