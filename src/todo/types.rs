//! To-do Types

use super::TodoError;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// A single to-do item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    #[serde(deserialize_with = "non_blank_text")]
    pub text: String,
    #[serde(with = "humantime_serde")]
    pub created_at: SystemTime,
    #[serde(with = "humantime_serde")]
    pub updated_at: SystemTime,
}

impl Todo {
    /// Create a new item with a fresh identifier
    pub fn new(text: &str, now: SystemTime) -> Result<Self, TodoError> {
        let text = normalize_text(text)?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            text,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace the text, keeping id and creation time
    pub fn with_text(&self, text: &str, now: SystemTime) -> Result<Self, TodoError> {
        let text = normalize_text(text)?;
        Ok(Self {
            id: self.id.clone(),
            text,
            created_at: self.created_at,
            updated_at: now,
        })
    }
}

fn normalize_text(text: &str) -> Result<String, TodoError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TodoError::EmptyText);
    }
    Ok(trimmed.to_string())
}

/// Stored items obey the same non-empty rule as new ones
fn non_blank_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    if text.trim().is_empty() {
        return Err(de::Error::custom("todo text must not be empty"));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::from_epoch_millis;

    #[test]
    fn test_new_trims_and_stamps() {
        let now = from_epoch_millis(1_700_000_000_000);
        let todo = Todo::new("  Buy groceries \n", now).unwrap();
        assert_eq!(todo.text, "Buy groceries");
        assert_eq!(todo.created_at, now);
        assert_eq!(todo.updated_at, now);
        assert!(!todo.id.is_empty());
    }

    #[test]
    fn test_rejects_blank_text() {
        let now = from_epoch_millis(0);
        assert!(matches!(Todo::new("   ", now), Err(TodoError::EmptyText)));
    }

    #[test]
    fn test_with_text_keeps_identity() {
        let created = from_epoch_millis(1_000);
        let later = from_epoch_millis(5_000);
        let todo = Todo::new("Original text", created).unwrap();
        let edited = todo.with_text("Buy organic groceries", later).unwrap();

        assert_eq!(edited.id, todo.id);
        assert_eq!(edited.created_at, created);
        assert_eq!(edited.updated_at, later);
        assert_eq!(edited.text, "Buy organic groceries");
    }

    #[test]
    fn test_wire_format() {
        let json = r#"{"id":"unique-123","text":"Original text",
            "createdAt":"2023-01-01T00:00:00.000Z","updatedAt":"2023-01-02T00:00:00Z"}"#;
        let todo: Todo = serde_json::from_str(json).unwrap();
        assert_eq!(todo.id, "unique-123");
        assert!(todo.updated_at > todo.created_at);

        let blank = json.replace("Original text", "  ");
        assert!(serde_json::from_str::<Todo>(&blank).is_err());

        let encoded = serde_json::to_string(&todo).unwrap();
        assert!(encoded.contains("\"createdAt\""));
        assert!(encoded.contains("\"updatedAt\""));
    }
}
