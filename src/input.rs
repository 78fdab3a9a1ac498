//! Terminal Input
//!
//! One reader thread owns stdin for the life of the process and forwards each
//! line over a channel. Callers that give up waiting (a timed-out prompt) just
//! stop receiving; the next line goes to whoever reads next.

use std::io::{self, BufRead};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, trace};

/// Shared line source for the biometric prompt and the interactive shell
pub struct LineReader {
    lines: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl LineReader {
    /// Wrap an existing line channel
    pub fn new(lines: mpsc::UnboundedReceiver<String>) -> Self {
        Self {
            lines: Mutex::new(lines),
        }
    }

    /// Start the stdin reader thread.
    ///
    /// The thread is detached so a pending read never holds up shutdown.
    pub fn stdin() -> io::Result<Self> {
        let (sender, receiver) = mpsc::unbounded_channel();

        std::thread::Builder::new()
            .name("stdin-reader".to_string())
            .spawn(move || {
                let stdin = io::stdin();
                for line in stdin.lock().lines() {
                    let line = match line {
                        Ok(line) => line,
                        Err(e) => {
                            debug!("Stopped reading stdin: {}", e);
                            break;
                        }
                    };
                    trace!("Read {} bytes from stdin", line.len());
                    if sender.send(line).is_err() {
                        break;
                    }
                }
                debug!("Stdin closed");
            })?;

        Ok(Self::new(receiver))
    }

    /// Next line without its terminator; `None` once input is closed
    pub async fn read_line(&self) -> Option<String> {
        self.lines.lock().await.recv().await
    }

    /// Drop lines typed before the caller started listening.
    ///
    /// Returns how many were dropped. Skips the drain if another reader is
    /// currently waiting.
    pub fn discard_pending(&self) -> usize {
        let Ok(mut lines) = self.lines.try_lock() else {
            return 0;
        };
        let mut dropped = 0;
        while lines.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!("Discarded {} stale input lines", dropped);
        }
        dropped
    }
}
