//! Authentication Manager

use super::{AuthOutcome, AuthState, Greeting, Session};
use crate::biometric::{BiometricProvider, Platform, PromptOutcome, SensorStatus};
use crate::clock::{ceil_minutes, Clock, SystemClock};
use crate::config::AuthConfig;
use crate::security::{LockoutStats, LockoutTracker};
use crate::storage::{
    KeyValueStore, AUTHENTICATED_MARKER, AUTH_KEY, BIOMETRIC_KEY, SESSION_KEY,
};
use crate::Result;
use anyhow::{bail, Context};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};
use tracing::{debug, error, info, warn};

/// In-memory state; starts empty with every process
#[derive(Debug, Default)]
struct MemoryState {
    lockout: LockoutTracker,
    session_expiry: Option<SystemTime>,
}

/// Biometric login with a sliding session and failed-attempt lockout
pub struct AuthManager {
    config: AuthConfig,
    store: Arc<dyn KeyValueStore>,
    biometrics: Arc<dyn BiometricProvider>,
    clock: Arc<dyn Clock>,
    platform: Platform,
    memory: Mutex<MemoryState>,
}

impl AuthManager {
    /// Create a new authentication manager
    pub fn new(
        config: AuthConfig,
        store: Arc<dyn KeyValueStore>,
        biometrics: Arc<dyn BiometricProvider>,
    ) -> Self {
        Self {
            config,
            store,
            biometrics,
            clock: Arc::new(SystemClock),
            platform: Platform::current(),
            memory: Mutex::new(MemoryState::default()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    fn memory(&self) -> MutexGuard<'_, MemoryState> {
        self.memory.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Check the persisted session, extending it when still active.
    ///
    /// Fails closed: missing, unreadable, corrupt, expired or expiry-less
    /// records all yield false, and all but unreadable ones are deleted.
    pub async fn is_session_valid(&self) -> bool {
        let payload = match self.store.get_item(SESSION_KEY).await {
            Ok(Some(payload)) => payload,
            Ok(None) => return false,
            Err(e) => {
                error!("Error checking session: {}", e);
                return false;
            }
        };

        let session = match Session::from_json(&payload) {
            Ok(session) => session,
            Err(e) => {
                warn!("Discarding corrupted session record: {}", e);
                self.discard_session().await;
                return false;
            }
        };

        let now = self.clock.now();
        if session.is_active(now) {
            self.extend_session(&session, now).await;
            return true;
        }

        debug!("Session expired or has no expiry, removing it");
        self.discard_session().await;
        false
    }

    async fn extend_session(&self, session: &Session, now: SystemTime) {
        let refreshed = session.refreshed(now, self.config.session_timeout);
        let result = match refreshed.to_json() {
            Ok(payload) => self
                .store
                .set_item(SESSION_KEY, &payload)
                .await
                .map_err(anyhow::Error::from),
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(()) => {
                self.memory().session_expiry = refreshed.expires_at();
                debug!("Session extended by {:?}", self.config.session_timeout);
            }
            Err(e) => error!("Error extending session: {}", e),
        }
    }

    async fn discard_session(&self) {
        if let Err(e) = self.store.remove_item(SESSION_KEY).await {
            error!("Error removing session: {}", e);
        }
        self.memory().session_expiry = None;
    }

    /// Persist a successful login. The session record is written last, so a
    /// failure on any write leaves no usable session behind.
    async fn complete_login(&self) -> Result<()> {
        if let Err(e) = self.write_login_records().await {
            self.rollback_login().await;
            return Err(e);
        }
        Ok(())
    }

    async fn write_login_records(&self) -> Result<()> {
        let now = self.clock.now();
        let session = Session::start(now, self.config.session_timeout);
        let payload = session.to_json().context("Failed to encode session")?;

        self.store
            .set_item(BIOMETRIC_KEY, AUTHENTICATED_MARKER)
            .await
            .context("Failed to record biometric enrollment")?;
        self.store
            .set_item(AUTH_KEY, AUTHENTICATED_MARKER)
            .await
            .context("Failed to record authentication history")?;
        self.store
            .set_item(SESSION_KEY, &payload)
            .await
            .context("Failed to create secure session")?;

        let mut memory = self.memory();
        memory.session_expiry = session.expires_at();
        memory.lockout.record_success();
        Ok(())
    }

    async fn rollback_login(&self) {
        for key in [SESSION_KEY, BIOMETRIC_KEY] {
            if let Err(e) = self.store.remove_item(key).await {
                error!("Error rolling back {} after failed login: {}", key, e);
            }
        }
        self.memory().session_expiry = None;
    }

    /// Remaining lockout if one is active; clears an expired one
    fn active_lockout(&self, now: SystemTime) -> Option<Duration> {
        let mut memory = self.memory();
        if memory.lockout.is_locked_out(now) {
            Some(memory.lockout.remaining(now).unwrap_or_default())
        } else {
            None
        }
    }

    /// Run one authentication attempt
    pub async fn authenticate(&self) -> AuthOutcome {
        if let Some(remaining) = self.active_lockout(self.clock.now()) {
            warn!(
                "Authentication refused, locked out for another {} minutes",
                ceil_minutes(remaining)
            );
            return AuthOutcome::LockedOut { remaining };
        }

        if self.is_session_valid().await {
            debug!("Existing session still valid");
            return AuthOutcome::Authenticated { resumed: true };
        }

        let status = match self.biometrics.sensor_status().await {
            Ok(status) => status,
            Err(e) => {
                error!("Authentication error: {:#}", e);
                return AuthOutcome::Error {
                    message: e.to_string(),
                };
            }
        };

        if !status.available {
            info!("Biometric sensor unavailable");
            return AuthOutcome::BiometricsUnavailable;
        }

        let options = self.config.prompt_options();
        let prompt = tokio::time::timeout(
            self.config.prompt_timeout,
            self.biometrics.prompt(&options),
        );
        let outcome = match prompt.await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                error!("Authentication error: {:#}", e);
                return AuthOutcome::Error {
                    message: e.to_string(),
                };
            }
            Err(_) => {
                warn!(
                    "Biometric prompt timed out after {:?}",
                    self.config.prompt_timeout
                );
                return AuthOutcome::TimedOut;
            }
        };

        match outcome {
            PromptOutcome::Success => {
                if let Err(e) = self.complete_login().await {
                    error!("Authentication error: {:#}", e);
                    return AuthOutcome::Error {
                        message: format!("{:#}", e),
                    };
                }
                info!("Authentication successful");
                AuthOutcome::Authenticated { resumed: false }
            }
            dismissed @ (PromptOutcome::CancelledByUser | PromptOutcome::FallbackChosen) => {
                debug!("Prompt dismissed by user: {:?}", dismissed);
                AuthOutcome::Cancelled
            }
            PromptOutcome::Failed(reason) => {
                warn!("Biometric verification failed: {}", reason);
                let policy = self.config.lockout_policy();
                let now = self.clock.now();
                let mut memory = self.memory();
                let locked_until = memory.lockout.record_failure(now, &policy);
                AuthOutcome::Rejected {
                    failed_attempts: memory.lockout.failed_attempts(),
                    lockout: locked_until.map(|_| policy.lockout_duration),
                }
            }
        }
    }

    /// Clear all persisted auth data and in-memory state.
    ///
    /// Every key removal is attempted and memory is reset regardless; the
    /// first removal failure is returned afterwards.
    pub async fn logout(&self) -> Result<()> {
        let mut first_error = None;
        for key in [SESSION_KEY, AUTH_KEY, BIOMETRIC_KEY] {
            if let Err(e) = self.store.remove_item(key).await {
                error!("Error during logout removing {}: {}", key, e);
                if first_error.is_none() {
                    first_error =
                        Some(anyhow::Error::new(e).context(format!("Failed to remove {}", key)));
                }
            }
        }

        {
            let mut memory = self.memory();
            memory.session_expiry = None;
            memory.lockout.reset();
        }
        info!("Logged out");

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Whether attempts are refused right now; clears an expired lockout
    pub fn is_locked_out(&self) -> bool {
        self.active_lockout(self.clock.now()).is_some()
    }

    /// Minutes left on the cached session expiry, rounded up
    pub fn remaining_session_minutes(&self) -> u64 {
        let Some(expiry) = self.memory().session_expiry else {
            return 0;
        };
        expiry
            .duration_since(self.clock.now())
            .map(ceil_minutes)
            .unwrap_or(0)
    }

    /// Cached session expiry, as last written by this process
    pub fn session_expiry(&self) -> Option<SystemTime> {
        self.memory().session_expiry
    }

    pub fn failed_attempts(&self) -> u32 {
        self.memory().lockout.failed_attempts()
    }

    pub fn lockout_stats(&self) -> LockoutStats {
        self.memory().lockout.stats()
    }

    /// State as known from memory, without touching storage
    pub fn state(&self) -> AuthState {
        let now = self.clock.now();
        if self.active_lockout(now).is_some() {
            if let Some(until) = self.memory().lockout.lockout_until() {
                return AuthState::Locked { until };
            }
        }

        match self.memory().session_expiry {
            Some(expiry) if now < expiry => AuthState::Authenticated {
                session_expiry: expiry,
            },
            _ => AuthState::Unauthenticated,
        }
    }

    /// Whether a login ever succeeded since the last logout
    pub async fn has_authenticated_before(&self) -> bool {
        match self.store.get_item(AUTH_KEY).await {
            Ok(value) => value.as_deref() == Some(AUTHENTICATED_MARKER),
            Err(e) => {
                error!("Error checking auth history: {}", e);
                false
            }
        }
    }

    async fn sensor_status(&self) -> SensorStatus {
        match self.biometrics.sensor_status().await {
            Ok(status) => status,
            Err(e) => {
                warn!("Biometric capability check failed: {:#}", e);
                SensorStatus::unavailable()
            }
        }
    }

    pub async fn is_biometric_supported(&self) -> bool {
        self.sensor_status().await.available
    }

    /// Supported and reporting a modality
    pub async fn is_biometric_enrolled(&self) -> bool {
        self.sensor_status().await.is_enrolled()
    }

    pub async fn biometric_display_name(&self) -> &'static str {
        self.sensor_status().await.display_name(self.platform)
    }

    /// Login screen copy for the current device and history
    pub async fn greeting(&self) -> Greeting {
        let status = self.sensor_status().await;
        let has_authenticated_before = self.has_authenticated_before().await;
        Greeting::new(
            status.available,
            status.is_enrolled(),
            has_authenticated_before,
            status.display_name(self.platform),
        )
    }

    /// Send the user to the OS page for setting up biometrics, trying the
    /// platform's specific pages before the generic app settings
    pub async fn open_biometric_settings(&self) -> Result<()> {
        for target in self.platform.settings_targets() {
            match self.biometrics.open_settings(&target).await {
                Ok(()) => {
                    debug!("Opened settings at {}", target);
                    return Ok(());
                }
                Err(e) => warn!("Error opening settings at {}: {:#}", target, e),
            }
        }
        bail!("No settings page could be opened")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biometric::{BiometryType, PromptOptions, SettingsTarget};
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;

    struct AlwaysSucceeds;

    #[async_trait]
    impl BiometricProvider for AlwaysSucceeds {
        async fn sensor_status(&self) -> anyhow::Result<SensorStatus> {
            Ok(SensorStatus::available(BiometryType::TouchId))
        }

        async fn prompt(&self, _options: &PromptOptions) -> anyhow::Result<PromptOutcome> {
            Ok(PromptOutcome::Success)
        }

        async fn open_settings(&self, _target: &SettingsTarget) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let clock = Arc::new(ManualClock::from_millis(1_000_000));
        let manager = AuthManager::new(
            AuthConfig::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(AlwaysSucceeds),
        )
        .with_clock(clock.clone());

        assert_eq!(manager.state(), AuthState::Unauthenticated);
        assert!(manager.authenticate().await.is_authenticated());
        assert!(matches!(manager.state(), AuthState::Authenticated { .. }));
        assert_eq!(manager.remaining_session_minutes(), 15);

        clock.advance(Duration::from_secs(15 * 60));
        assert_eq!(manager.state(), AuthState::Unauthenticated);
        assert_eq!(manager.remaining_session_minutes(), 0);
    }

    #[tokio::test]
    async fn test_greeting_uses_history() {
        let manager = AuthManager::new(
            AuthConfig::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(AlwaysSucceeds),
        )
        .with_platform(Platform::Ios);

        assert_eq!(manager.greeting().await.title, "Secure TODO");
        manager.authenticate().await;
        let greeting = manager.greeting().await;
        assert_eq!(greeting.message, "Welcome back! Use Touch ID to continue");
    }
}
