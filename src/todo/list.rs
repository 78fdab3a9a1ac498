//! To-do List
//!
//! Newest-first list kept in memory and written through to the store on every
//! change. The in-memory copy only changes after the write succeeded.

use super::{Todo, TodoError, TodoStore};
use crate::clock::Clock;
use std::sync::Arc;
use tracing::info;

pub struct TodoList {
    store: TodoStore,
    clock: Arc<dyn Clock>,
    todos: Vec<Todo>,
}

impl TodoList {
    /// Create an empty list; call [`TodoList::load`] to read stored items
    pub fn new(store: TodoStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            todos: Vec::new(),
        }
    }

    /// Replace the in-memory list with the stored one
    pub async fn load(&mut self) -> Result<&[Todo], TodoError> {
        self.todos = self.store.load().await?;
        Ok(&self.todos)
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn get(&self, id: &str) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    /// Add an item at the top of the list
    pub async fn add(&mut self, text: &str) -> Result<Todo, TodoError> {
        let todo = Todo::new(text, self.clock.now())?;

        let mut next = Vec::with_capacity(self.todos.len() + 1);
        next.push(todo.clone());
        next.extend(self.todos.iter().cloned());

        self.commit(next).await?;
        info!("Added todo {}", todo.id);
        Ok(todo)
    }

    /// Change an item's text in place
    pub async fn update(&mut self, id: &str, text: &str) -> Result<Todo, TodoError> {
        let index = self
            .todos
            .iter()
            .position(|todo| todo.id == id)
            .ok_or_else(|| TodoError::NotFound(id.to_string()))?;
        let updated = self.todos[index].with_text(text, self.clock.now())?;

        let mut next = self.todos.clone();
        next[index] = updated.clone();

        self.commit(next).await?;
        info!("Updated todo {}", id);
        Ok(updated)
    }

    /// Remove an item. Returns false, without writing, when it does not exist.
    pub async fn delete(&mut self, id: &str) -> Result<bool, TodoError> {
        if self.get(id).is_none() {
            return Ok(false);
        }

        let next: Vec<Todo> = self
            .todos
            .iter()
            .filter(|todo| todo.id != id)
            .cloned()
            .collect();

        self.commit(next).await?;
        info!("Deleted todo {}", id);
        Ok(true)
    }

    async fn commit(&mut self, next: Vec<Todo>) -> Result<(), TodoError> {
        self.store.save(&next).await?;
        self.todos = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use std::time::Duration;

    fn list() -> (TodoList, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::from_millis(1_700_000_000_000));
        let store = TodoStore::new(Arc::new(MemoryStore::new()));
        (TodoList::new(store, clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_add_prepends() {
        let (mut todos, _) = list();
        let first = todos.add("Buy groceries").await.unwrap();
        let second = todos.add("Walk the dog").await.unwrap();

        let ids: Vec<&str> = todos.todos().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
    }

    #[tokio::test]
    async fn test_update_preserves_id() {
        let (mut todos, clock) = list();
        let todo = todos.add("Buy groceries").await.unwrap();
        clock.advance(Duration::from_secs(30));

        let updated = todos.update(&todo.id, "Buy organic groceries").await.unwrap();
        assert_eq!(updated.id, todo.id);
        assert_eq!(updated.created_at, todo.created_at);
        assert!(updated.updated_at > todo.updated_at);
        assert_eq!(todos.get(&todo.id).unwrap().text, "Buy organic groceries");
    }

    #[tokio::test]
    async fn test_update_rejects_empty_and_unknown() {
        let (mut todos, _) = list();
        let todo = todos.add("Buy groceries").await.unwrap();

        assert!(matches!(
            todos.update(&todo.id, "  ").await,
            Err(TodoError::EmptyText)
        ));
        assert!(matches!(
            todos.update("missing", "text").await,
            Err(TodoError::NotFound(_))
        ));
        assert_eq!(todos.get(&todo.id).unwrap().text, "Buy groceries");
    }

    #[tokio::test]
    async fn test_delete() {
        let (mut todos, _) = list();
        let keep = todos.add("Walk the dog").await.unwrap();
        let gone = todos.add("Finish assignment").await.unwrap();

        assert!(todos.delete(&gone.id).await.unwrap());
        assert!(!todos.delete(&gone.id).await.unwrap());
        assert_eq!(todos.todos(), &[keep]);
    }
}
