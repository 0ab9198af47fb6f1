// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Retry policy: error classification and exponential backoff.
//!
//! Everything here is pure. The request executor and the connection manager
//! own their attempt counters; this module only does the math.

use std::time::Duration;

use crate::error::{ErrorClass, ErrorInfo};

/// Default ceiling applied by [`BackoffPolicy`].
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Returns true for transient failures (timeouts, 5xx, unreachable network).
pub fn is_retryable(error: &ErrorInfo) -> bool {
    error.class() == ErrorClass::Transient
}

/// `base * 2^attempt`, saturating instead of overflowing.
pub fn compute_delay(attempt: u32, base: Duration) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}

/// [`compute_delay`] clamped to `cap`.
pub fn compute_delay_capped(attempt: u32, base: Duration, cap: Duration) -> Duration {
    compute_delay(attempt, base).min(cap)
}

/// One failed attempt, as seen by a retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryAttempt {
    /// Zero-based number of the attempt that failed.
    pub attempt_number: u32,
    pub error_class: ErrorClass,
    /// Delay before the next attempt; `None` if no retry follows.
    pub computed_delay: Option<Duration>,
}

/// Backoff parameters shared by request retries and reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub max_delay: Duration,
    /// Number of retries allowed after the first failure.
    pub max_retries: u32,
}

impl BackoffPolicy {
    pub fn new(base: Duration, max_retries: u32) -> Self {
        BackoffPolicy {
            base,
            max_delay: DEFAULT_MAX_DELAY,
            max_retries,
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        compute_delay_capped(attempt, self.base, self.max_delay)
    }

    /// Decides what follows a failed attempt.
    ///
    /// A retry is scheduled only for retryable errors with retries remaining.
    pub fn on_failure(&self, attempt_number: u32, error: &ErrorInfo) -> RetryAttempt {
        let computed_delay = if is_retryable(error) && attempt_number < self.max_retries {
            Some(self.delay(attempt_number))
        } else {
            None
        };
        RetryAttempt {
            attempt_number,
            error_class: error.class(),
            computed_delay,
        }
    }
}

/// Attempt counter paired with a [`BackoffPolicy`].
///
/// Owned by whichever state machine is retrying; reset on success.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    attempt: u32,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        Backoff { policy, attempt: 0 }
    }

    /// Number of delays handed out since the last reset.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.policy.max_retries
    }

    /// Delay before the next attempt, or `None` once the budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }
        let delay = self.policy.delay(self.attempt);
        self.attempt += 1;
        Some(delay)
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
