//! Session Countdown
//!
//! Periodically re-reads the remaining session time for display.

use super::AuthManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Background task publishing remaining session minutes on a fixed interval
pub struct SessionCountdown {
    receiver: watch::Receiver<u64>,
    handle: JoinHandle<()>,
}

impl SessionCountdown {
    /// Start ticking. The first value is published immediately.
    pub fn spawn(manager: Arc<AuthManager>, interval: Duration) -> Self {
        let (sender, receiver) = watch::channel(manager.remaining_session_minutes());

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let minutes = manager.remaining_session_minutes();
                if sender.send(minutes).is_err() {
                    debug!("Session countdown has no listeners, stopping");
                    break;
                }
            }
        });

        Self { receiver, handle }
    }

    /// Receiver that is notified on every tick
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.receiver.clone()
    }

    /// Most recently published value
    pub fn current(&self) -> u64 {
        *self.receiver.borrow()
    }
}

impl Drop for SessionCountdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
