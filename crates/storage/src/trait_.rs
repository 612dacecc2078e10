//! Storage trait abstraction.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A key holds a value of a different type than requested
    #[error("Type mismatch for key {key}: expected {expected}")]
    TypeMismatch {
        /// Offending key
        key: String,
        /// Requested type
        expected: &'static str,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// A value held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    /// Boolean flag
    Bool(bool),
    /// 64-bit integer, usually epoch milliseconds
    Long(i64),
}

impl StoredValue {
    /// Type name used in mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            StoredValue::Bool(_) => "bool",
            StoredValue::Long(_) => "long",
        }
    }
}

/// Shared handle to a store, passed explicitly to every objective and task.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Durable string-keyed storage for booleans and integers.
///
/// Writes go through `&self`: implementations guard their state internally so a
/// single handle can be shared by every objective and task of a process.
/// Missing keys read as the supplied default.
pub trait KeyValueStore: Send + Sync {
    /// Read a raw value.
    fn get(&self, key: &str) -> Result<Option<StoredValue>>;

    /// Write a raw value (create or overwrite).
    fn put(&self, key: &str, value: StoredValue) -> Result<()>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// List all keys, sorted.
    fn keys(&self) -> Result<Vec<String>>;

    /// Read a boolean, falling back to `default` when the key is missing.
    fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key)? {
            None => Ok(default),
            Some(StoredValue::Bool(value)) => Ok(value),
            Some(_) => Err(StorageError::TypeMismatch {
                key: key.to_string(),
                expected: "bool",
            }),
        }
    }

    /// Write a boolean.
    fn put_bool(&self, key: &str, value: bool) -> Result<()> {
        self.put(key, StoredValue::Bool(value))
    }

    /// Read an integer, falling back to `default` when the key is missing.
    fn get_long(&self, key: &str, default: i64) -> Result<i64> {
        match self.get(key)? {
            None => Ok(default),
            Some(StoredValue::Long(value)) => Ok(value),
            Some(_) => Err(StorageError::TypeMismatch {
                key: key.to_string(),
                expected: "long",
            }),
        }
    }

    /// Write an integer.
    fn put_long(&self, key: &str, value: i64) -> Result<()> {
        self.put(key, StoredValue::Long(value))
    }
}
