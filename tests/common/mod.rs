//! Shared test doubles

#![allow(dead_code)]

use async_trait::async_trait;
use securetodo::auth::AuthManager;
use securetodo::biometric::{
    BiometricProvider, BiometryType, Platform, PromptOptions, PromptOutcome, SensorStatus,
    SettingsTarget,
};
use securetodo::clock::ManualClock;
use securetodo::config::AuthConfig;
use securetodo::storage::{KeyValueStore, MemoryStore, StorageError};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// 2023-11-14T22:13:20Z
pub const START_MILLIS: u64 = 1_700_000_000_000;

/// What the scripted prompt does on its next call
#[derive(Debug, Clone)]
pub enum Scripted {
    Answer(PromptOutcome),
    Error(String),
    Hang,
}

/// Biometric provider that replays a script
pub struct ScriptedBiometrics {
    status: SensorStatus,
    script: Mutex<VecDeque<Scripted>>,
    prompt_calls: AtomicUsize,
    broken_targets: Vec<SettingsTarget>,
    opened: Mutex<Vec<SettingsTarget>>,
}

impl ScriptedBiometrics {
    pub fn new(status: SensorStatus) -> Self {
        Self {
            status,
            script: Mutex::new(VecDeque::new()),
            prompt_calls: AtomicUsize::new(0),
            broken_targets: Vec::new(),
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn face_id() -> Self {
        Self::new(SensorStatus::available(BiometryType::FaceId))
    }

    pub fn with_broken_targets(mut self, targets: Vec<SettingsTarget>) -> Self {
        self.broken_targets = targets;
        self
    }

    pub fn push(&self, step: Scripted) {
        self.script.lock().unwrap().push_back(step);
    }

    pub fn answer(&self, outcome: PromptOutcome) {
        self.push(Scripted::Answer(outcome));
    }

    pub fn prompt_calls(&self) -> usize {
        self.prompt_calls.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> Vec<SettingsTarget> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl BiometricProvider for ScriptedBiometrics {
    async fn sensor_status(&self) -> anyhow::Result<SensorStatus> {
        Ok(self.status)
    }

    async fn prompt(&self, _options: &PromptOptions) -> anyhow::Result<PromptOutcome> {
        self.prompt_calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Scripted::Answer(PromptOutcome::Success));

        match step {
            Scripted::Answer(outcome) => Ok(outcome),
            Scripted::Error(message) => Err(anyhow::anyhow!(message)),
            Scripted::Hang => std::future::pending().await,
        }
    }

    async fn open_settings(&self, target: &SettingsTarget) -> anyhow::Result<()> {
        if self.broken_targets.contains(target) {
            anyhow::bail!("cannot open {}", target);
        }
        self.opened.lock().unwrap().push(target.clone());
        Ok(())
    }
}

/// Memory store whose removals and writes can be made to fail per key
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    failing_removes: Mutex<HashSet<String>>,
    failing_sets: Mutex<HashSet<String>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_remove(&self, key: &str) {
        self.failing_removes.lock().unwrap().insert(key.to_string());
    }

    pub fn fail_set(&self, key: &str) {
        self.failing_sets.lock().unwrap().insert(key.to_string());
    }

    pub fn snapshot(&self, key: &str) -> Option<String> {
        self.inner.snapshot(key)
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get_item(key).await
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.failing_sets.lock().unwrap().contains(key) {
            return Err(StorageError::Backend(format!("write to {} refused", key)));
        }
        self.inner.set_item(key, value).await
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        if self.failing_removes.lock().unwrap().contains(key) {
            return Err(StorageError::Backend(format!("delete of {} refused", key)));
        }
        self.inner.remove_item(key).await
    }
}

/// Everything an auth test needs
pub struct Harness {
    pub manager: Arc<AuthManager>,
    pub store: Arc<FlakyStore>,
    pub biometrics: Arc<ScriptedBiometrics>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(AuthConfig::default(), ScriptedBiometrics::face_id())
    }

    pub fn with(config: AuthConfig, biometrics: ScriptedBiometrics) -> Self {
        let store = Arc::new(FlakyStore::new());
        let biometrics = Arc::new(biometrics);
        let clock = Arc::new(ManualClock::from_millis(START_MILLIS));
        let manager = AuthManager::new(config, store.clone(), biometrics.clone())
            .with_clock(clock.clone())
            .with_platform(Platform::Ios);

        Self {
            manager: Arc::new(manager),
            store,
            biometrics,
            clock,
        }
    }
}
