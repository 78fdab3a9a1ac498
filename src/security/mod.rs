//! Security Module
//!
//! Brute-force protection for the biometric login.

pub mod lockout;

pub use lockout::{LockoutPolicy, LockoutStats, LockoutTracker};
