//! Retry and backoff policy
//!
//! The acquisition loop is a small state machine:
//!
//! ```text
//! Attempting(1) ──fail──► Attempting(2) ──fail──► … ──fail──► Exhausted
//!       │                       │                      │
//!       └──────── ok ───────────┴──────── ok ──────────┴──► Succeeded
//! ```
//!
//! Between two attempts the loop sleeps for [`RetryPolicy::delay_for`]:
//! `2^n * base_delay` plus a jitter drawn from `(0, jitter_max]`. Rate-limit
//! failures and generic failures share the formula; they differ only in how
//! exhaustion is reported.

use crate::core::error::{ConfigError, ConfigResult};
use rand::Rng;
use std::time::{Duration, Instant};

/// Attempt cap and backoff shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of endpoint attempts, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Upper bound of the random jitter added to every delay
    pub jitter_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(4000),
            jitter_max: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Deterministic part of the delay after failed attempt `attempt`
    ///
    /// Saturates to `Duration::MAX` instead of overflowing for absurd
    /// attempt numbers.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let Some(factor) = 2u32.checked_pow(attempt) else {
            return Duration::MAX;
        };
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(Duration::MAX)
    }

    /// Jitter in `(0, jitter_max]`, at microsecond resolution
    pub fn jitter<R: Rng>(&self, rng: &mut R) -> Duration {
        let ceiling = u64::try_from(self.jitter_max.as_micros())
            .unwrap_or(u64::MAX)
            .max(1);
        Duration::from_micros(rng.random_range(1..=ceiling))
    }

    /// Full delay to wait after failed attempt `attempt`
    pub fn delay_for<R: Rng>(&self, attempt: u32, rng: &mut R) -> Duration {
        self.backoff(attempt).saturating_add(self.jitter(rng))
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                reason: "max_attempts must be > 0".to_string(),
            });
        }
        if self.base_delay.is_zero() {
            return Err(ConfigError::Invalid {
                reason: "base_delay must be > 0".to_string(),
            });
        }
        if self.jitter_max.is_zero() {
            return Err(ConfigError::Invalid {
                reason: "jitter_max must be > 0".to_string(),
            });
        }
        // Attempts start at 1, so consecutive delays differ by at least
        // 2 * base_delay - jitter_max
        if self.jitter_max > self.base_delay.saturating_mul(2) {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "jitter_max ({:?}) must not exceed twice base_delay ({:?})",
                    self.jitter_max, self.base_delay
                ),
            });
        }
        Ok(())
    }
}

/// Position of the acquisition loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Attempting(u32),
    Succeeded,
    Exhausted,
}

impl RetryState {
    pub fn initial() -> Self {
        RetryState::Attempting(1)
    }

    /// Transition after a failed attempt
    pub fn advance(self, policy: &RetryPolicy) -> Self {
        match self {
            RetryState::Attempting(n) if n < policy.max_attempts => RetryState::Attempting(n + 1),
            RetryState::Attempting(_) => RetryState::Exhausted,
            terminal => terminal,
        }
    }

    /// Transition after an attempt produced a move
    pub fn succeed(self) -> Self {
        match self {
            RetryState::Attempting(_) => RetryState::Succeeded,
            terminal => terminal,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, RetryState::Attempting(_))
    }
}

/// One endpoint attempt, alive only inside the retry loop
#[derive(Debug, Clone, Copy)]
pub struct Attempt {
    pub number: u32,
    pub started_at: Instant,
}

impl Attempt {
    pub fn begin(number: u32) -> Self {
        Self {
            number,
            started_at: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
