//! Retry policy: failure classification and backoff computation.
//!
//! Only transport-level failures trigger a retry. Application-level HTTP
//! error statuses are returned as unsuccessful responses and never reach the
//! retry loop; aborts are never retried.

use crate::Error;
use rand::Rng;
use std::time::Duration;

/// Default cap on the backoff delay between attempts.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Defines when and how to retry failed attempts.
///
/// # Examples
///
/// ```
/// use dialpath::RetryStrategy;
/// use std::time::Duration;
///
/// // No retries.
/// let none = RetryStrategy::None;
///
/// // 100ms, 200ms, 400ms... capped at 30s, each inflated by up to 10% jitter.
/// let backoff = RetryStrategy::exponential(Duration::from_millis(100), 5);
/// ```
#[derive(Debug, Clone, Default)]
pub enum RetryStrategy {
    /// Do not retry failed attempts.
    #[default]
    None,

    /// Retry with exponentially increasing delays.
    ///
    /// The delay before retry `n` (0-indexed) is
    /// `min(base_delay * 2^n * (1 + jitter), max_delay)` where jitter is a
    /// random factor in `[0, 0.1]` when enabled.
    ExponentialBackoff {
        /// The delay before the first retry.
        base_delay: Duration,
        /// Upper bound on any single delay.
        max_delay: Duration,
        /// The maximum number of retries; the pipeline makes
        /// `max_retries + 1` total attempts.
        max_retries: usize,
        /// Whether to inflate delays by up to 10% (recommended).
        jitter: bool,
    },
}

impl RetryStrategy {
    /// Exponential backoff with jitter and the default 30 second cap.
    pub fn exponential(base_delay: Duration, max_retries: usize) -> Self {
        RetryStrategy::ExponentialBackoff {
            base_delay,
            max_delay: DEFAULT_MAX_DELAY,
            max_retries,
            jitter: true,
        }
    }

    /// Returns the delay before retry `attempt` (0-indexed), or `None` once
    /// retries are exhausted.
    pub fn delay_for_attempt(&self, attempt: usize) -> Option<Duration> {
        match self {
            RetryStrategy::None => None,
            RetryStrategy::ExponentialBackoff {
                base_delay,
                max_delay,
                max_retries,
                jitter,
            } => {
                if attempt >= *max_retries {
                    return None;
                }

                let multiplier = 2u32.saturating_pow(attempt.min(u32::MAX as usize) as u32);
                let mut delay = base_delay.saturating_mul(multiplier);
                if *jitter {
                    let factor = 1.0 + rand::thread_rng().gen_range(0.0..=0.1);
                    delay = delay.mul_f64(factor);
                }
                Some(delay.min(*max_delay))
            }
        }
    }

    /// The maximum number of retries this strategy allows.
    pub fn max_retries(&self) -> usize {
        match self {
            RetryStrategy::None => 0,
            RetryStrategy::ExponentialBackoff { max_retries, .. } => *max_retries,
        }
    }
}

/// Trait for deciding whether a failed attempt should be retried.
///
/// The default policy is [`RetryOnTransport`]; implement this to restrict or
/// extend it.
///
/// # Examples
///
/// ```
/// use dialpath::{Error, RetryPredicate};
///
/// struct NeverAfterTwo;
///
/// impl RetryPredicate for NeverAfterTwo {
///     fn should_retry(&self, error: &Error, attempt: usize) -> bool {
///         attempt <= 2 && error.is_retryable()
///     }
/// }
/// ```
pub trait RetryPredicate: Send + Sync {
    /// Decides whether to retry. `attempt` is the attempt that just failed,
    /// 1-indexed.
    fn should_retry(&self, error: &Error, attempt: usize) -> bool;
}

/// Retry transport-level failures only: network errors and timeouts. Aborts,
/// parse errors, and everything application-level are final.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnTransport;

impl RetryPredicate for RetryOnTransport {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        error.is_retryable()
    }
}
