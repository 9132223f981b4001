//! Retry policy for registry requests.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::duration_ms;
use crate::error::PdlError;

/// Retry decision result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after a delay.
    RetryAfter(Duration),
    /// Do not retry.
    DoNotRetry,
}

/// Retry policy configuration.
///
/// The delay is the same for every attempt: `base_delay` plus a random jitter
/// of at most `max_jitter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// Fixed delay between attempts.
    #[serde(default = "default_base_delay", with = "duration_ms")]
    pub base_delay: Duration,
    /// Maximum jitter added to each delay.
    #[serde(default = "default_max_jitter", with = "duration_ms")]
    pub max_jitter: Duration,
}

const fn default_max_retries() -> usize {
    5
}

const fn default_base_delay() -> Duration {
    Duration::from_millis(500)
}

const fn default_max_jitter() -> Duration {
    Duration::from_millis(500)
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay: default_base_delay(),
            max_jitter: default_max_jitter(),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    /// Maximum number of attempts, including the first.
    #[must_use]
    pub const fn max_attempts(&self) -> usize {
        self.max_retries.saturating_add(1)
    }

    /// Decide whether to retry after `attempt` (1-based) failed with `error`.
    #[must_use]
    pub fn decide(&self, error: &PdlError, attempt: usize) -> RetryDecision {
        if attempt >= self.max_attempts() || !error.is_retryable() {
            return RetryDecision::DoNotRetry;
        }

        let jitter_ms = if self.max_jitter.is_zero() {
            0
        } else {
            let jitter_max = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
            rand::thread_rng().gen_range(0..=jitter_max)
        };
        RetryDecision::RetryAfter(self.base_delay.saturating_add(Duration::from_millis(jitter_ms)))
    }
}
