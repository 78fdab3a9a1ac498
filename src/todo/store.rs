//! To-do Persistence

use super::{Todo, TodoError};
use crate::storage::{KeyValueStore, TODOS_KEY};
use std::sync::Arc;
use tracing::{debug, error};

/// Reads and writes the whole to-do list under one key
#[derive(Clone)]
pub struct TodoStore {
    store: Arc<dyn KeyValueStore>,
}

impl TodoStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load the list. A missing record is an empty list; an unparseable one
    /// is an error, never silently empty.
    pub async fn load(&self) -> Result<Vec<Todo>, TodoError> {
        let payload = self.store.get_item(TODOS_KEY).await.map_err(|e| {
            error!("Error loading todos: {}", e);
            e
        })?;

        let Some(payload) = payload else {
            debug!("No stored todos");
            return Ok(Vec::new());
        };

        let todos: Vec<Todo> = serde_json::from_str(&payload).map_err(|e| {
            error!("Error loading todos: {}", e);
            TodoError::Load(e)
        })?;

        debug!("Loaded {} todos", todos.len());
        Ok(todos)
    }

    /// Overwrite the stored list
    pub async fn save(&self, todos: &[Todo]) -> Result<(), TodoError> {
        let payload = serde_json::to_string(todos).map_err(TodoError::Save)?;
        self.store.set_item(TODOS_KEY, &payload).await.map_err(|e| {
            error!("Error saving todos: {}", e);
            e
        })?;
        debug!("Saved {} todos", todos.len());
        Ok(())
    }
}
