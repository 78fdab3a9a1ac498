//! Configuration Types

use crate::biometric::{BiometryType, Platform, PromptOptions, SensorStatus};
use crate::security::LockoutPolicy;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub auth: AuthConfig,
    pub biometric: BiometricConfig,
    pub storage: StorageConfig,
    pub monitoring: MonitoringConfig,
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    pub max_failed_attempts: u32,
    #[serde(with = "humantime_serde")]
    pub lockout_duration: Duration,
    #[serde(with = "humantime_serde")]
    pub session_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub prompt_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub countdown_interval: Duration,
    pub prompt_message: String,
    pub fallback_prompt_message: String,
}

impl AuthConfig {
    pub fn lockout_policy(&self) -> LockoutPolicy {
        LockoutPolicy {
            max_failed_attempts: self.max_failed_attempts,
            lockout_duration: self.lockout_duration,
        }
    }

    pub fn prompt_options(&self) -> PromptOptions {
        PromptOptions {
            prompt_message: self.prompt_message.clone(),
            fallback_prompt_message: self.fallback_prompt_message.clone(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        let prompt = PromptOptions::default();
        let lockout = LockoutPolicy::default();
        Self {
            max_failed_attempts: lockout.max_failed_attempts,
            lockout_duration: lockout.lockout_duration,
            session_timeout: Duration::from_secs(15 * 60),
            prompt_timeout: Duration::from_secs(30),
            countdown_interval: Duration::from_secs(60),
            prompt_message: prompt.prompt_message,
            fallback_prompt_message: prompt.fallback_prompt_message,
        }
    }
}

/// Biometric sensor configuration for the console provider
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BiometricConfig {
    /// "auto", "ios", "android" or "other"
    pub platform: String,
    /// "face_id", "touch_id", "biometrics" or "none"
    pub modality: String,
}

impl BiometricConfig {
    pub fn platform(&self) -> Result<Platform> {
        self.platform.parse()
    }

    pub fn sensor_status(&self) -> Result<SensorStatus> {
        if self.modality == "none" {
            return Ok(SensorStatus::unavailable());
        }
        let biometry_type: BiometryType = self.modality.parse()?;
        Ok(SensorStatus::available(biometry_type))
    }
}

impl Default for BiometricConfig {
    fn default() -> Self {
        Self {
            platform: "auto".to_string(),
            modality: "biometrics".to_string(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// "file" or "memory"
    pub backend: String,
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "file".to_string(),
            data_dir: PathBuf::from("securetodo-data"),
        }
    }
}

/// Monitoring configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub log_level: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}
