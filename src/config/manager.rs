//! Configuration Manager

use super::Config;
use crate::Result;
use anyhow::{bail, Context};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Manages configuration loading and validation
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> Result<Config> {
        if path.exists() {
            tracing::info!("Loading configuration from: {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            let config = Self::parse(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

            tracing::info!("Configuration loaded and validated successfully");
            Ok(config)
        } else {
            tracing::warn!("Configuration file not found at {}, using defaults", path.display());
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str) -> Result<Config> {
        let config: Config = toml::from_str(content)?;
        config
            .validate()
            .with_context(|| "Configuration validation failed")?;
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn load_from_env() -> Result<Config> {
        Self::load_from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from defaults overridden by a variable lookup
    pub fn load_from_vars<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(attempts) = lookup("SECURETODO_MAX_FAILED_ATTEMPTS") {
            config.auth.max_failed_attempts = attempts
                .parse::<u32>()
                .with_context(|| format!("Invalid SECURETODO_MAX_FAILED_ATTEMPTS: {}", attempts))?;
        }

        if let Some(duration) = lookup("SECURETODO_LOCKOUT_DURATION") {
            config.auth.lockout_duration = humantime::parse_duration(&duration)
                .with_context(|| format!("Invalid SECURETODO_LOCKOUT_DURATION: {}", duration))?;
        }

        if let Some(timeout) = lookup("SECURETODO_SESSION_TIMEOUT") {
            config.auth.session_timeout = humantime::parse_duration(&timeout)
                .with_context(|| format!("Invalid SECURETODO_SESSION_TIMEOUT: {}", timeout))?;
        }

        if let Some(timeout) = lookup("SECURETODO_PROMPT_TIMEOUT") {
            config.auth.prompt_timeout = humantime::parse_duration(&timeout)
                .with_context(|| format!("Invalid SECURETODO_PROMPT_TIMEOUT: {}", timeout))?;
        }

        if let Some(modality) = lookup("SECURETODO_BIOMETRIC_MODALITY") {
            config.biometric.modality = modality;
        }

        if let Some(platform) = lookup("SECURETODO_PLATFORM") {
            config.biometric.platform = platform;
        }

        if let Some(backend) = lookup("SECURETODO_STORAGE_BACKEND") {
            config.storage.backend = backend;
        }

        if let Some(data_dir) = lookup("SECURETODO_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(data_dir);
        }

        if let Some(log_level) = lookup("SECURETODO_LOG_LEVEL") {
            config.monitoring.log_level = log_level;
        }

        config.validate()?;
        Ok(config)
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.validate_auth_config()
            .with_context(|| "Authentication configuration validation failed")?;

        self.validate_biometric_config()
            .with_context(|| "Biometric configuration validation failed")?;

        self.validate_storage_config()
            .with_context(|| "Storage configuration validation failed")?;

        self.validate_monitoring_config()
            .with_context(|| "Monitoring configuration validation failed")?;

        Ok(())
    }

    /// Validate authentication configuration
    fn validate_auth_config(&self) -> Result<()> {
        let auth = &self.auth;
        let day = Duration::from_secs(24 * 3600);

        if auth.max_failed_attempts == 0 {
            bail!("max_failed_attempts must be greater than 0");
        }

        if auth.max_failed_attempts > 100 {
            bail!("max_failed_attempts cannot exceed 100");
        }

        if auth.lockout_duration.is_zero() {
            bail!("lockout_duration must be greater than 0");
        }

        if auth.lockout_duration > day {
            bail!("lockout_duration cannot exceed 24 hours");
        }

        if auth.session_timeout.is_zero() {
            bail!("session_timeout must be greater than 0");
        }

        if auth.session_timeout > day {
            bail!("session_timeout cannot exceed 24 hours");
        }

        if auth.prompt_timeout.is_zero() {
            bail!("prompt_timeout must be greater than 0");
        }

        if auth.prompt_timeout > Duration::from_secs(600) {
            bail!("prompt_timeout cannot exceed 10 minutes");
        }

        if auth.countdown_interval < Duration::from_secs(1) {
            bail!("countdown_interval must be at least 1 second");
        }

        if auth.prompt_message.trim().is_empty() {
            bail!("prompt_message must not be empty");
        }

        Ok(())
    }

    /// Validate biometric configuration
    fn validate_biometric_config(&self) -> Result<()> {
        self.biometric.platform()?;
        self.biometric.sensor_status()?;
        Ok(())
    }

    /// Validate storage configuration
    fn validate_storage_config(&self) -> Result<()> {
        if !["file", "memory"].contains(&self.storage.backend.as_str()) {
            bail!("storage.backend must be 'file' or 'memory'");
        }

        if self.storage.backend == "file" && self.storage.data_dir.as_os_str().is_empty() {
            bail!("storage.data_dir must be set for the file backend");
        }

        Ok(())
    }

    /// Validate monitoring configuration
    fn validate_monitoring_config(&self) -> Result<()> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.monitoring.log_level.as_str()) {
            bail!("monitoring.log_level must be one of: {}", valid_log_levels.join(", "));
        }

        Ok(())
    }

    /// Merge with CLI arguments
    pub fn merge_with_cli_args(
        &mut self,
        data_dir: Option<&Path>,
        log_level: Option<&str>,
        memory: bool,
    ) {
        if let Some(dir) = data_dir {
            self.storage.data_dir = dir.to_path_buf();
            tracing::info!("CLI override: data directory set to {}", dir.display());
        }

        if let Some(level) = log_level {
            self.monitoring.log_level = level.to_string();
            tracing::info!("CLI override: log level set to {}", level);
        }

        if memory {
            self.storage.backend = "memory".to_string();
            tracing::info!("CLI override: using in-memory storage");
        }
    }
}
