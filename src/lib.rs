//! SecureTodo Library
//!
//! Local to-do list gated by biometric authentication.
//!
//! Login is a biometric prompt backed by a persisted, sliding-window session
//! and an in-memory lockout after repeated failures. The to-do list is stored
//! locally and rewritten in full on every change.

pub mod auth;
pub mod biometric;
pub mod clock;
pub mod config;
pub mod input;
pub mod security;
pub mod storage;
pub mod todo;

pub use auth::{AuthManager, AuthOutcome};
pub use config::Config;
pub use todo::{Todo, TodoList, TodoStore};

/// Common error type for the application
pub type Result<T> = anyhow::Result<T>;
