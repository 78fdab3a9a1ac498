//! To-do Module
//!
//! The to-do list and its persistence as a single serialized sequence.

pub mod list;
pub mod store;
pub mod types;

pub use list::TodoList;
pub use store::TodoStore;
pub use types::Todo;

use crate::storage::StorageError;
use thiserror::Error;

/// To-do errors
#[derive(Error, Debug)]
pub enum TodoError {
    #[error("Failed to load todos: {0}")]
    Load(#[source] serde_json::Error),

    #[error("Failed to save todos: {0}")]
    Save(#[source] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Please enter a todo item")]
    EmptyText,

    #[error("Todo not found: {0}")]
    NotFound(String),
}
