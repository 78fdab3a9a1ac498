//! Biometric Module
//!
//! The OS biometric capability sits behind [`BiometricProvider`]. Platform
//! bindings implement it; [`ConsoleBiometrics`] stands in on a terminal.

pub mod console;
pub mod types;

pub use console::ConsoleBiometrics;
pub use types::{
    BiometryType, Platform, PromptOptions, PromptOutcome, SensorStatus, SettingsTarget,
    DEVICE_AUTHENTICATION,
};

use async_trait::async_trait;

/// OS-level biometric capability
#[async_trait]
pub trait BiometricProvider: Send + Sync {
    /// Report whether a sensor is usable and which modality it offers
    async fn sensor_status(&self) -> anyhow::Result<SensorStatus>;

    /// Show the native prompt and wait for the user.
    ///
    /// Errors are reserved for the binding itself misbehaving; a rejected
    /// fingerprint or face is `Ok(PromptOutcome::Failed(..))`.
    async fn prompt(&self, options: &PromptOptions) -> anyhow::Result<PromptOutcome>;

    /// Send the user to a settings page
    async fn open_settings(&self, target: &SettingsTarget) -> anyhow::Result<()>;
}
