//! Fixed-delay retry loop with an interruptible sleep.

use std::{fmt::Display, time::Duration};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use log::debug;
use parking_lot::Mutex;

/// Wakes threads sleeping between retries.
///
/// Nothing is ever sent on the channel: dropping the sender disconnects it,
/// which wakes every sleeper at once and keeps later sleeps from blocking.
#[derive(Debug)]
pub struct Interrupt {
    wake_tx: Mutex<Option<Sender<()>>>,
    wake_rx: Receiver<()>,
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::new()
    }
}

impl Interrupt {
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            wake_tx: Mutex::new(Some(tx)),
            wake_rx: rx,
        }
    }

    /// Sleep for `delay`. Returns `false` if interrupted.
    pub fn sleep(&self, delay: Duration) -> bool {
        matches!(
            self.wake_rx.recv_timeout(delay),
            Err(RecvTimeoutError::Timeout)
        )
    }

    /// Interrupt current and future sleeps. Idempotent.
    pub fn interrupt(&self) {
        drop(self.wake_tx.lock().take());
    }

    pub fn is_interrupted(&self) -> bool {
        self.wake_tx.lock().is_none()
    }
}

/// Retry policy shared by the stream and HTTP senders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_secs(3),
        }
    }
}

/// Run `action` until it succeeds, retrying every error.
///
/// See [`retry_if`].
pub fn retry<T, E: Display>(
    action: impl FnMut() -> Result<T, E>,
    continue_condition: impl Fn() -> bool,
    policy: RetryPolicy,
    interrupt: &Interrupt,
) -> Result<T, E> {
    retry_if(action, |_| true, continue_condition, policy, interrupt)
}

/// Run `action`, retrying errors accepted by `retryable`.
///
/// At most `max_retries + 1` attempts are made. The loop gives up and
/// returns the latest error as soon as the error is not retryable,
/// `continue_condition` turns false, or the sleep is interrupted.
pub fn retry_if<T, E: Display>(
    mut action: impl FnMut() -> Result<T, E>,
    retryable: impl Fn(&E) -> bool,
    continue_condition: impl Fn() -> bool,
    policy: RetryPolicy,
    interrupt: &Interrupt,
) -> Result<T, E> {
    let mut attempts: u32 = 0;
    loop {
        let err = match action() {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        attempts = attempts.saturating_add(1);
        if attempts > policy.max_retries || !retryable(&err) || !continue_condition() {
            return Err(err);
        }
        debug!(
            "attempt {attempts} failed: {err}; retrying in {:?}",
            policy.delay
        );
        if !interrupt.sleep(policy.delay) {
            debug!("retry sleep interrupted");
            return Err(err);
        }
    }
}
