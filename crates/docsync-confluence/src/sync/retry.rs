//! Bounded retry and visibility polling.

use std::thread;
use std::time::Duration;

use tracing::debug;

/// Default number of attempts.
const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default pause between attempts.
const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// Bounded retry policy for remote writes and read-after-write polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_DELAY,
        }
    }
}

/// Outcome of an operation that did not succeed within the policy.
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every attempt failed; carries the last error.
    Exhausted { attempts: u32, source: E },
    /// Polled condition never became true.
    TimedOut { attempts: u32 },
    /// Polling stopped on an error.
    Failed(E),
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Run `op` until it succeeds, at most `max_attempts` times.
    ///
    /// `op` receives the 1-based attempt number.
    ///
    /// # Errors
    ///
    /// Returns [`RetryError::Exhausted`] with the last error when every
    /// attempt fails.
    pub fn retry<T, E>(&self, mut op: impl FnMut(u32) -> Result<T, E>) -> Result<T, RetryError<E>> {
        let attempts = self.attempts();
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(source) if attempt >= attempts => {
                    return Err(RetryError::Exhausted { attempts, source });
                }
                Err(_) => {
                    debug!(attempt, attempts, "Attempt failed, retrying");
                    thread::sleep(self.delay);
                    attempt += 1;
                }
            }
        }
    }

    /// Poll `op` until it yields a value, at most `max_attempts` times.
    ///
    /// # Errors
    ///
    /// Returns [`RetryError::Failed`] as soon as `op` fails and
    /// [`RetryError::TimedOut`] when no attempt yields a value.
    pub fn poll<T, E>(
        &self,
        mut op: impl FnMut() -> Result<Option<T>, E>,
    ) -> Result<T, RetryError<E>> {
        let attempts = self.attempts();
        for attempt in 1..=attempts {
            if let Some(value) = op().map_err(RetryError::Failed)? {
                return Ok(value);
            }
            if attempt < attempts {
                debug!(attempt, attempts, "Not there yet, polling again");
                thread::sleep(self.delay);
            }
        }
        Err(RetryError::TimedOut { attempts })
    }
}
