//! Terminal Biometric Provider
//!
//! Simulates a sensor on hosts without one: the prompt is a question on the
//! terminal and the answer decides the outcome.

use super::{BiometricProvider, PromptOptions, PromptOutcome, SensorStatus, SettingsTarget};
use super::types::{USER_CANCELLATION, USER_FALLBACK};
use crate::input::LineReader;
use anyhow::Context;
use async_trait::async_trait;
use std::io::Write;
use std::sync::Arc;
use tracing::debug;

/// Console-driven stand-in for a platform sensor
pub struct ConsoleBiometrics {
    status: SensorStatus,
    input: Arc<LineReader>,
}

impl ConsoleBiometrics {
    pub fn new(status: SensorStatus, input: Arc<LineReader>) -> Self {
        Self { status, input }
    }

    /// Translate a typed answer into the raw `{ success, error }` pair a
    /// platform binding would report
    pub fn interpret_answer(answer: &str) -> PromptOutcome {
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => PromptOutcome::from_raw(true, None),
            "" | "c" | "cancel" => PromptOutcome::from_raw(false, Some(USER_CANCELLATION)),
            "f" | "fallback" | "passcode" => PromptOutcome::from_raw(false, Some(USER_FALLBACK)),
            _ => PromptOutcome::from_raw(false, Some("Authentication failed")),
        }
    }
}

#[async_trait]
impl BiometricProvider for ConsoleBiometrics {
    async fn sensor_status(&self) -> anyhow::Result<SensorStatus> {
        Ok(self.status)
    }

    async fn prompt(&self, options: &PromptOptions) -> anyhow::Result<PromptOutcome> {
        let question = format!(
            "{} [y = verified, n = not recognised, f = {}, c = cancel]: ",
            options.prompt_message, options.fallback_prompt_message
        );

        // Anything typed before the question is not an answer to it
        self.input.discard_pending();

        let mut stderr = std::io::stderr();
        stderr
            .write_all(question.as_bytes())
            .context("Failed to show prompt")?;
        stderr.flush().context("Failed to show prompt")?;

        let answer = self
            .input
            .read_line()
            .await
            .context("Input closed before the prompt was answered")?;

        let outcome = Self::interpret_answer(&answer);
        debug!("Console prompt answered: {:?}", outcome);
        Ok(outcome)
    }

    async fn open_settings(&self, target: &SettingsTarget) -> anyhow::Result<()> {
        eprintln!("Open {} to set up biometric authentication.", target);
        Ok(())
    }
}
