//! Authentication Types

use crate::clock::{ceil_minutes, epoch_millis, from_epoch_millis};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// Persisted session record.
///
/// Stored as `{"expiry": <epoch ms>, "timestamp": <epoch ms>}`. Records written
/// by this crate always carry an expiry; one without is treated as invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
    #[serde(rename = "timestamp")]
    pub created_at: u64,
}

impl Session {
    /// Start a session that expires `timeout` after `now`
    pub fn start(now: SystemTime, timeout: Duration) -> Self {
        Self {
            expiry: Some(epoch_millis(now + timeout)),
            created_at: epoch_millis(now),
        }
    }

    /// Same session, re-armed to expire `timeout` after `now`
    pub fn refreshed(&self, now: SystemTime, timeout: Duration) -> Self {
        Self {
            expiry: Some(epoch_millis(now + timeout)),
            created_at: self.created_at,
        }
    }

    pub fn expires_at(&self) -> Option<SystemTime> {
        self.expiry.map(from_epoch_millis)
    }

    /// Valid only with an expiry strictly in the future
    pub fn is_active(&self, now: SystemTime) -> bool {
        matches!(self.expiry, Some(expiry) if epoch_millis(now) < expiry)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }
}

/// Coarse authentication state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Locked { until: SystemTime },
    Authenticated { session_expiry: SystemTime },
}

/// Follow-up the user can take from a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeAction {
    Dismiss,
    OpenSettings,
}

/// User-facing message attached to an authentication outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
    pub action: NoticeAction,
}

impl Notice {
    fn new(title: &str, message: String, action: NoticeAction) -> Self {
        Self {
            title: title.to_string(),
            message,
            action,
        }
    }
}

/// Result of an authentication attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Logged in. `resumed` is true when an existing session was reused
    /// and no prompt was shown.
    Authenticated { resumed: bool },
    /// Refused without prompting because of an active lockout
    LockedOut { remaining: Duration },
    /// No usable biometric sensor
    BiometricsUnavailable,
    /// User dismissed the prompt or chose the fallback; not penalized
    Cancelled,
    /// Verification failed and counted toward the lockout
    Rejected {
        failed_attempts: u32,
        lockout: Option<Duration>,
    },
    /// The prompt did not answer in time
    TimedOut,
    /// Provider or storage failure
    Error { message: String },
}

impl AuthOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// Message to surface to the user, if any
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Self::Authenticated { .. } | Self::Cancelled => None,
            Self::LockedOut { remaining } => Some(Notice::new(
                "Access Locked",
                format!(
                    "Please wait {} more minutes before trying again.",
                    ceil_minutes(*remaining)
                ),
                NoticeAction::Dismiss,
            )),
            Self::BiometricsUnavailable => Some(Notice::new(
                "Authentication Required",
                "Please set up biometric authentication in your device settings.".to_string(),
                NoticeAction::OpenSettings,
            )),
            Self::Rejected {
                lockout: Some(duration),
                ..
            } => Some(Notice::new(
                "Too Many Failed Attempts",
                format!(
                    "Access locked for {} minutes due to security.",
                    ceil_minutes(*duration)
                ),
                NoticeAction::Dismiss,
            )),
            Self::Rejected { lockout: None, .. } => None,
            Self::TimedOut => Some(Notice::new(
                "Authentication Error",
                "Authentication timed out. Please try again.".to_string(),
                NoticeAction::Dismiss,
            )),
            Self::Error { .. } => Some(Notice::new(
                "Authentication Error",
                "An unexpected error occurred. Please try again.".to_string(),
                NoticeAction::Dismiss,
            )),
        }
    }
}

/// Login screen copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeting {
    pub title: String,
    pub message: String,
    pub action_label: String,
}

impl Greeting {
    pub fn new(
        supported: bool,
        enrolled: bool,
        has_authenticated_before: bool,
        display_name: &str,
    ) -> Self {
        let title = if has_authenticated_before {
            "Welcome Back!"
        } else {
            "Secure TODO"
        };

        let (message, action_label) = if !supported {
            (
                "Device authentication required".to_string(),
                "Use Device Authentication".to_string(),
            )
        } else if !enrolled {
            (
                format!("Please set up {} first", display_name),
                "Setup Required".to_string(),
            )
        } else if has_authenticated_before {
            (
                format!("Welcome back! Use {} to continue", display_name),
                format!("Unlock with {}", display_name),
            )
        } else {
            (
                format!("Secure your TODOs with {}", display_name),
                format!("Setup {}", display_name),
            )
        };

        Self {
            title: title.to_string(),
            message,
            action_label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_wire_format() {
        let session = Session::start(from_epoch_millis(1_000), Duration::from_secs(900));
        let json = session.to_json().unwrap();
        assert_eq!(json, r#"{"expiry":901000,"timestamp":1000}"#);
        assert_eq!(Session::from_json(&json).unwrap(), session);
    }

    #[test]
    fn test_session_without_expiry_is_inactive() {
        let session = Session::from_json(r#"{"timestamp":1000}"#).unwrap();
        assert_eq!(session.expiry, None);
        assert!(!session.is_active(from_epoch_millis(0)));
    }

    #[test]
    fn test_session_activity_boundary() {
        let session = Session::start(from_epoch_millis(0), Duration::from_secs(60));
        assert!(session.is_active(from_epoch_millis(59_999)));
        assert!(!session.is_active(from_epoch_millis(60_000)));
    }

    #[test]
    fn test_refresh_keeps_creation_time() {
        let session = Session::start(from_epoch_millis(0), Duration::from_secs(60));
        let refreshed = session.refreshed(from_epoch_millis(30_000), Duration::from_secs(60));
        assert_eq!(refreshed.created_at, 0);
        assert_eq!(refreshed.expiry, Some(90_000));
    }

    #[test]
    fn test_notices() {
        let locked = AuthOutcome::LockedOut {
            remaining: Duration::from_secs(90),
        };
        let notice = locked.notice().unwrap();
        assert_eq!(notice.title, "Access Locked");
        assert_eq!(notice.message, "Please wait 2 more minutes before trying again.");

        let lockout = AuthOutcome::Rejected {
            failed_attempts: 3,
            lockout: Some(Duration::from_secs(300)),
        };
        assert_eq!(
            lockout.notice().unwrap().message,
            "Access locked for 5 minutes due to security."
        );

        assert_eq!(
            AuthOutcome::BiometricsUnavailable.notice().unwrap().action,
            NoticeAction::OpenSettings
        );
        assert_ne!(
            AuthOutcome::TimedOut.notice().unwrap().message,
            AuthOutcome::Error {
                message: "boom".to_string()
            }
            .notice()
            .unwrap()
            .message
        );
        assert!(AuthOutcome::Cancelled.notice().is_none());
        assert!(AuthOutcome::Rejected {
            failed_attempts: 1,
            lockout: None
        }
        .notice()
        .is_none());
    }

    #[test]
    fn test_greeting() {
        let first = Greeting::new(true, true, false, "Face ID");
        assert_eq!(first.title, "Secure TODO");
        assert_eq!(first.message, "Secure your TODOs with Face ID");

        let returning = Greeting::new(true, true, true, "Face ID");
        assert_eq!(returning.title, "Welcome Back!");
        assert_eq!(returning.message, "Welcome back! Use Face ID to continue");
        assert_eq!(returning.action_label, "Unlock with Face ID");

        let unenrolled = Greeting::new(true, false, false, "Touch ID");
        assert_eq!(unenrolled.action_label, "Setup Required");

        let unsupported = Greeting::new(false, false, false, "Device Authentication");
        assert_eq!(unsupported.message, "Device authentication required");
    }
}
