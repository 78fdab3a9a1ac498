//! Storage Module
//!
//! Durable key-value persistence for credentials and the to-do list.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

/// Serialized session record
pub const SESSION_KEY: &str = "secure_session";
/// Auth-history marker
pub const AUTH_KEY: &str = "auth_state";
/// Biometric-enrollment marker
pub const BIOMETRIC_KEY: &str = "biometric_state";
/// Serialized to-do sequence
pub const TODOS_KEY: &str = "secure_todos";

/// Value written under the marker keys
pub const AUTHENTICATED_MARKER: &str = "authenticated";

/// Storage layer errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// String key-value store with string values
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key has never been written or was removed
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value; removing a missing key is not an error
    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}
