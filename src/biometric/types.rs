//! Biometric Types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw failure reason reported when the user dismisses the prompt
pub const USER_CANCELLATION: &str = "User cancellation";
/// Raw failure reason reported when the user picks the passcode fallback
pub const USER_FALLBACK: &str = "User fallback";

/// Biometric modality reported by the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiometryType {
    FaceId,
    TouchId,
    Biometrics,
}

impl std::str::FromStr for BiometryType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "face_id" => Ok(Self::FaceId),
            "touch_id" => Ok(Self::TouchId),
            "biometrics" => Ok(Self::Biometrics),
            other => anyhow::bail!("unknown biometry type '{}'", other),
        }
    }
}

/// Host platform, which decides display names and settings links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Ios,
    Android,
    Other,
}

impl Platform {
    /// Platform this binary was compiled for
    pub fn current() -> Self {
        if cfg!(target_os = "ios") {
            Self::Ios
        } else if cfg!(target_os = "android") {
            Self::Android
        } else {
            Self::Other
        }
    }

    /// Settings destinations for enrolling biometrics, most specific first.
    /// The generic app settings page is always last.
    pub fn settings_targets(&self) -> Vec<SettingsTarget> {
        let mut targets = match self {
            Self::Ios => vec![
                SettingsTarget::Url("App-prefs:PASSCODE".to_string()),
                SettingsTarget::Url("prefs:root=PASSCODE".to_string()),
            ],
            Self::Android => vec![SettingsTarget::Intent(
                "android.settings.SECURITY_SETTINGS".to_string(),
            )],
            Self::Other => Vec::new(),
        };
        targets.push(SettingsTarget::AppSettings);
        targets
    }
}

impl std::str::FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ios" => Ok(Self::Ios),
            "android" => Ok(Self::Android),
            "other" => Ok(Self::Other),
            "auto" => Ok(Self::current()),
            other => anyhow::bail!("unknown platform '{}'", other),
        }
    }
}

/// Somewhere the OS can take the user to set up biometrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsTarget {
    Url(String),
    Intent(String),
    AppSettings,
}

impl fmt::Display for SettingsTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{}", url),
            Self::Intent(action) => write!(f, "intent:{}", action),
            Self::AppSettings => write!(f, "app settings"),
        }
    }
}

/// Result of the sensor capability check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SensorStatus {
    pub available: bool,
    pub biometry_type: Option<BiometryType>,
}

impl SensorStatus {
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn available(biometry_type: BiometryType) -> Self {
        Self {
            available: true,
            biometry_type: Some(biometry_type),
        }
    }

    /// Available with a reported modality
    pub fn is_enrolled(&self) -> bool {
        self.available && self.biometry_type.is_some()
    }

    /// Name to show for the login method
    pub fn display_name(&self, platform: Platform) -> &'static str {
        if !self.available {
            return DEVICE_AUTHENTICATION;
        }

        match (platform, self.biometry_type) {
            (Platform::Ios, Some(BiometryType::FaceId)) => "Face ID",
            (Platform::Ios, Some(BiometryType::TouchId)) => "Touch ID",
            (Platform::Android, Some(BiometryType::Biometrics)) => "Biometric Authentication",
            _ => DEVICE_AUTHENTICATION,
        }
    }
}

/// Generic login method name
pub const DEVICE_AUTHENTICATION: &str = "Device Authentication";

/// Text shown by the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptOptions {
    pub prompt_message: String,
    pub fallback_prompt_message: String,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            prompt_message: "Authenticate to access your TODOs".to_string(),
            fallback_prompt_message: "Use Passcode".to_string(),
        }
    }
}

/// What the biometric prompt reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    Success,
    CancelledByUser,
    FallbackChosen,
    Failed(String),
}

impl PromptOutcome {
    /// Map a raw `{ success, error }` pair from a platform binding
    pub fn from_raw(success: bool, error: Option<&str>) -> Self {
        if success {
            return Self::Success;
        }
        match error {
            Some(USER_CANCELLATION) => Self::CancelledByUser,
            Some(USER_FALLBACK) => Self::FallbackChosen,
            Some(reason) => Self::Failed(reason.to_string()),
            None => Self::Failed("unknown".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names() {
        let face = SensorStatus::available(BiometryType::FaceId);
        let touch = SensorStatus::available(BiometryType::TouchId);
        let generic = SensorStatus::available(BiometryType::Biometrics);

        assert_eq!(face.display_name(Platform::Ios), "Face ID");
        assert_eq!(touch.display_name(Platform::Ios), "Touch ID");
        assert_eq!(generic.display_name(Platform::Android), "Biometric Authentication");
        assert_eq!(face.display_name(Platform::Android), DEVICE_AUTHENTICATION);
        assert_eq!(generic.display_name(Platform::Other), DEVICE_AUTHENTICATION);
        assert_eq!(
            SensorStatus::unavailable().display_name(Platform::Ios),
            DEVICE_AUTHENTICATION
        );
    }

    #[test]
    fn test_enrollment_requires_modality() {
        assert!(SensorStatus::available(BiometryType::TouchId).is_enrolled());
        let no_modality = SensorStatus {
            available: true,
            biometry_type: None,
        };
        assert!(!no_modality.is_enrolled());
        assert!(!SensorStatus::unavailable().is_enrolled());
    }

    #[test]
    fn test_prompt_outcome_from_raw() {
        assert_eq!(PromptOutcome::from_raw(true, None), PromptOutcome::Success);
        assert_eq!(
            PromptOutcome::from_raw(false, Some("User cancellation")),
            PromptOutcome::CancelledByUser
        );
        assert_eq!(
            PromptOutcome::from_raw(false, Some("User fallback")),
            PromptOutcome::FallbackChosen
        );
        assert_eq!(
            PromptOutcome::from_raw(false, Some("Biometry lockout")),
            PromptOutcome::Failed("Biometry lockout".to_string())
        );
    }

    #[test]
    fn test_settings_targets_end_with_app_settings() {
        let ios = Platform::Ios.settings_targets();
        assert_eq!(ios.len(), 3);
        assert_eq!(ios[0], SettingsTarget::Url("App-prefs:PASSCODE".to_string()));
        assert_eq!(ios.last(), Some(&SettingsTarget::AppSettings));

        let android = Platform::Android.settings_targets();
        assert_eq!(
            android[0],
            SettingsTarget::Intent("android.settings.SECURITY_SETTINGS".to_string())
        );
        assert_eq!(Platform::Other.settings_targets(), vec![SettingsTarget::AppSettings]);
    }
}
