//! Retry policy and per-request state machine.
//!
//! A request moves `Pending -> Retrying(n) -> Succeeded | Failed`. Only
//! `Timeout` and `RateLimited` failures re-enter `Retrying`; everything else
//! goes straight to `Failed`. Delays come from a pure function of the retry
//! number so they can be tested without a clock.

use std::time::Duration;

use crate::error::FailureReason;

/// Bounded exponential backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,

    /// Delay before the first retry
    pub base_delay: Duration,

    /// Ceiling for any single delay
    pub max_delay: Duration,

    /// Add up to half a base delay of random jitter
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retry number `retry` (1-based).
    ///
    /// `jitter_sample` is expected in `[0, 1)` and contributes strictly less
    /// than `base_delay / 2`, which is smaller than the gap between two
    /// consecutive exponential steps. Delays are therefore non-decreasing in
    /// `retry` for any samples, and the cap keeps them non-decreasing once
    /// reached.
    pub fn delay_for(&self, retry: u32, jitter_sample: f64) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        let exponential = self.base_delay.saturating_mul(factor);
        let jitter = if self.jitter {
            self.base_delay.mul_f64(jitter_sample.clamp(0.0, 0.999_999) * 0.5)
        } else {
            Duration::ZERO
        };
        exponential.saturating_add(jitter).min(self.max_delay)
    }

    /// Next state after attempt number `attempt` (1-based) failed.
    pub fn on_failure<T>(&self, attempt: u32, reason: FailureReason) -> RequestState<T> {
        if reason.is_retryable() && attempt < self.max_attempts {
            RequestState::Retrying {
                attempt,
                last: reason,
            }
        } else {
            RequestState::Failed(reason)
        }
    }
}

/// Lifecycle of one oracle request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestState<T> {
    Pending,
    /// `attempt` attempts have failed so far; another is allowed
    Retrying { attempt: u32, last: FailureReason },
    Succeeded(T),
    Failed(FailureReason),
}

impl<T> RequestState<T> {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_))
    }
}
