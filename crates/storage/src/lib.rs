//! Persistent key-value storage for Unlock.
//!
//! Objectives and tasks persist a handful of booleans and epoch-millisecond
//! timestamps under string keys. This crate provides the store abstraction,
//! an in-memory implementation and a JSON file reference implementation.

#![warn(missing_docs)]

pub mod trait_;
pub mod memory;
#[cfg(feature = "json")]
pub mod json_storage;

pub use trait_::{KeyValueStore, SharedStore, StorageError, StoredValue, Result};
pub use memory::MemoryStore;
#[cfg(feature = "json")]
pub use json_storage::JsonFileStore;
