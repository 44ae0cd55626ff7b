//! Fixed-schedule retry for blocking operations.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

/// Default pauses between attempts, in milliseconds.
pub const DEFAULT_RETRY_DELAYS_MS: [u64; 4] = [10, 100, 1000, 5000];

/// Pauses taken between consecutive attempts.
///
/// A schedule of `n` delays allows `n + 1` attempts; there is no pause after
/// the last one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySchedule {
    delays: Vec<Duration>,
}

impl RetrySchedule {
    /// Creates a schedule from explicit delays.
    #[must_use]
    pub fn new(delays: impl IntoIterator<Item = Duration>) -> Self {
        Self {
            delays: delays.into_iter().collect(),
        }
    }

    /// A schedule with a single attempt.
    #[must_use]
    pub fn once() -> Self {
        Self { delays: Vec::new() }
    }

    /// Returns the delays.
    #[must_use]
    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    /// Total number of attempts.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.delays.len() + 1
    }
}

impl Default for RetrySchedule {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_DELAYS_MS.map(Duration::from_millis))
    }
}

/// Blocks the calling thread between attempts.
pub trait Sleeper: Send + Sync {
    /// Pauses for `duration`.
    fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<S: Sleeper + ?Sized> Sleeper for Arc<S> {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

/// Failure of [`retry`].
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt failed; `last` is the final failure.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        /// Number of attempts made.
        attempts: usize,
        /// Error of the last attempt.
        last: E,
    },

    /// The error was not retryable.
    #[error("{0}")]
    Aborted(E),
}

/// Runs `op` until it succeeds, an error is not retryable, or the schedule
/// runs out.
///
/// `op` receives the 1-based attempt number. Each retryable failure except the
/// last is logged and followed by the scheduled pause.
///
/// # Errors
///
/// Returns [`RetryError::Aborted`] when `is_retryable` rejects an error, and
/// [`RetryError::Exhausted`] with the last error once every attempt failed.
pub fn retry<T, E, S, P, Op>(
    schedule: &RetrySchedule,
    sleeper: &S,
    is_retryable: P,
    mut op: Op,
) -> Result<T, RetryError<E>>
where
    E: fmt::Display,
    S: Sleeper + ?Sized,
    P: Fn(&E) -> bool,
    Op: FnMut(usize) -> Result<T, E>,
{
    let mut delays = schedule.delays().iter();
    let mut attempt = 0;

    loop {
        attempt += 1;
        let err = match op(attempt) {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !is_retryable(&err) {
            warn!(attempt, error = %err, "Attempt failed with a non-retryable error");
            return Err(RetryError::Aborted(err));
        }

        let Some(delay) = delays.next() else {
            warn!(attempt, error = %err, "Final attempt failed");
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last: err,
            });
        };

        warn!(
            attempt,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "Attempt failed, retrying"
        );
        sleeper.sleep(*delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSleeper(Mutex<Vec<Duration>>);

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.0.lock().push(duration);
        }
    }

    fn ms(values: &[u64]) -> Vec<Duration> {
        values.iter().copied().map(Duration::from_millis).collect()
    }

    #[test]
    fn default_schedule_has_five_attempts() {
        let schedule = RetrySchedule::default();
        assert_eq!(schedule.attempts(), 5);
        assert_eq!(schedule.delays(), ms(&[10, 100, 1000, 5000]).as_slice());
    }

    #[test]
    fn always_failing_sleeps_between_attempts_only() {
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;
        let result: Result<(), _> = retry(&RetrySchedule::default(), &sleeper, |_| true, |_| {
            calls += 1;
            Err("down")
        });

        match result.unwrap_err() {
            RetryError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 5);
                assert_eq!(last, "down");
            }
            RetryError::Aborted(_) => panic!("expected exhaustion"),
        }
        assert_eq!(calls, 5);
        assert_eq!(*sleeper.0.lock(), ms(&[10, 100, 1000, 5000]));
    }

    #[test]
    fn success_stops_retrying() {
        let sleeper = RecordingSleeper::default();
        let result = retry(&RetrySchedule::default(), &sleeper, |_| true, |attempt| {
            if attempt < 3 {
                Err("not yet")
            } else {
                Ok(attempt)
            }
        });
        assert_eq!(result.unwrap(), 3);
        assert_eq!(*sleeper.0.lock(), ms(&[10, 100]));
    }

    #[test]
    fn non_retryable_aborts_immediately() {
        let sleeper = RecordingSleeper::default();
        let result: Result<(), _> =
            retry(&RetrySchedule::default(), &sleeper, |e: &&str| *e != "fatal", |_| {
                Err("fatal")
            });
        assert!(matches!(result, Err(RetryError::Aborted("fatal"))));
        assert!(sleeper.0.lock().is_empty());
    }

    #[test]
    fn single_attempt_schedule_never_sleeps() {
        let sleeper = RecordingSleeper::default();
        let result: Result<(), _> = retry(&RetrySchedule::once(), &sleeper, |_| true, |_| Err(1));
        assert!(matches!(
            result,
            Err(RetryError::Exhausted {
                attempts: 1,
                last: 1
            })
        ));
        assert!(sleeper.0.lock().is_empty());
    }
}
