//! Authentication Module
//!
//! Handles biometric login, session expiry and lockout.

pub mod countdown;
pub mod manager;
pub mod types;

pub use countdown::SessionCountdown;
pub use manager::AuthManager;
pub use types::{AuthOutcome, AuthState, Greeting, Notice, NoticeAction, Session};
