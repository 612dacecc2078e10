//! JSON file storage implementation.
//!
//! Keeps every key in a single JSON object on disk. The file is read once when
//! the store is opened and rewritten on every write. A write only reaches the
//! in-memory map once the file has been written, so the two never diverge.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use super::{KeyValueStore, Result, StorageError, StoredValue};

type Values = BTreeMap<String, StoredValue>;

/// File-based JSON storage backend.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<Values>,
}

impl JsonFileStore {
    /// Open the store at `path`, creating parent directories as needed.
    /// A missing file is treated as an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let values = read_json(&path)?.unwrap_or_default();
        debug!(path = %path.display(), "Opened JSON store");

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Values>> {
        self.values
            .lock()
            .map_err(|_| StorageError::Other("JSON store lock poisoned".to_string()))
    }

    fn flush(&self, values: &Values) -> Result<()> {
        let json = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, json.as_bytes())?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<StoredValue>> {
        Ok(self.lock()?.get(key).copied())
    }

    fn put(&self, key: &str, value: StoredValue) -> Result<()> {
        let mut values = self.lock()?;
        let mut updated = values.clone();
        updated.insert(key.to_string(), value);
        self.flush(&updated)?;
        *values = updated;
        debug!(key, ?value, "Persisted value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.lock()?;
        if !values.contains_key(key) {
            return Ok(());
        }
        let mut updated = values.clone();
        updated.remove(key);
        self.flush(&updated)?;
        *values = updated;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

fn read_json(path: &Path) -> Result<Option<Values>> {
    match fs::read_to_string(path) {
        Ok(json) if json.trim().is_empty() => Ok(None),
        Ok(json) => {
            let values = serde_json::from_str(&json)?;
            Ok(Some(values))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
