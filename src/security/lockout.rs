//! Failed-Attempt Lockout
//!
//! Counts consecutive rejected biometric attempts and refuses further attempts
//! for a fixed window once the threshold is reached. State is in-memory only
//! and starts fresh with every process.

use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// Lockout thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub max_failed_attempts: u32,
    pub lockout_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failed_attempts: 3,
            lockout_duration: Duration::from_secs(5 * 60),
        }
    }
}

/// Tracks failed attempts and the active lockout window
#[derive(Debug, Default, Clone)]
pub struct LockoutTracker {
    failed_attempts: u32,
    lockout_until: Option<SystemTime>,
    total_failures: u64,
    lockouts_issued: u64,
}

impl LockoutTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether attempts are currently refused.
    ///
    /// An expired lockout is cleared here, which also resets the failure counter.
    pub fn is_locked_out(&mut self, now: SystemTime) -> bool {
        let Some(until) = self.lockout_until else {
            return false;
        };

        if now < until {
            return true;
        }

        self.lockout_until = None;
        self.failed_attempts = 0;
        info!("Lockout expired, allowing authentication attempts");
        false
    }

    /// Time left in the active lockout, if any
    pub fn remaining(&self, now: SystemTime) -> Option<Duration> {
        self.lockout_until
            .and_then(|until| until.duration_since(now).ok())
            .filter(|d| !d.is_zero())
    }

    /// Record a rejected attempt. Returns the end of the lockout window when
    /// this failure reached the threshold.
    pub fn record_failure(&mut self, now: SystemTime, policy: &LockoutPolicy) -> Option<SystemTime> {
        self.failed_attempts += 1;
        self.total_failures += 1;
        debug!(
            "Recorded failed attempt {}/{}",
            self.failed_attempts, policy.max_failed_attempts
        );

        if self.failed_attempts >= policy.max_failed_attempts {
            let until = now + policy.lockout_duration;
            self.lockout_until = Some(until);
            self.lockouts_issued += 1;
            warn!(
                "{} consecutive failed attempts, locking out for {:?}",
                self.failed_attempts, policy.lockout_duration
            );
            return Some(until);
        }

        None
    }

    /// Clear the consecutive-failure count after a successful authentication
    pub fn record_success(&mut self) {
        if self.failed_attempts > 0 {
            debug!("Clearing {} failed attempts", self.failed_attempts);
        }
        self.failed_attempts = 0;
    }

    /// Drop the counter and any active lockout
    pub fn reset(&mut self) {
        self.failed_attempts = 0;
        self.lockout_until = None;
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn lockout_until(&self) -> Option<SystemTime> {
        self.lockout_until
    }

    pub fn stats(&self) -> LockoutStats {
        LockoutStats {
            failed_attempts: self.failed_attempts,
            lockout_until: self.lockout_until,
            total_failures: self.total_failures,
            lockouts_issued: self.lockouts_issued,
        }
    }
}

/// Snapshot of lockout counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockoutStats {
    pub failed_attempts: u32,
    pub lockout_until: Option<SystemTime>,
    pub total_failures: u64,
    pub lockouts_issued: u64,
}
