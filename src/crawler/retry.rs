//! Bounded retry state machine
//!
//! The fetcher drives a [`RetryState`] once per page: every attempt is
//! registered with `begin_attempt`, and every transient failure asks the state
//! whether another attempt is allowed and how long to back off first. No I/O
//! happens here, so the schedule is testable on its own.

use crate::config::FetchConfig;
use std::time::Duration;

/// Attempt budget and exponential backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Backoff after the first failed attempt
    pub base_delay: Duration,

    /// Upper bound for any single backoff
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    /// Backoff to wait after failed attempt number `attempt` (1-based)
    ///
    /// `base_delay × 2^(attempt-1)`, capped at `max_delay`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

/// What to do after a transient failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for the given backoff, then attempt again
    Retry { after: Duration },

    /// The attempt budget is spent
    GiveUp,
}

/// Attempt counter for one fetch
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    attempts_made: u32,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempts_made: 0,
        }
    }

    /// Registers a new attempt and returns its 1-based number
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempts_made += 1;
        self.attempts_made
    }

    /// Decides whether the attempt that just failed transiently is retried
    pub fn on_transient_failure(&self) -> RetryDecision {
        if self.attempts_made >= self.policy.max_attempts {
            RetryDecision::GiveUp
        } else {
            RetryDecision::Retry {
                after: self.policy.delay_after(self.attempts_made),
            }
        }
    }

    pub fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    pub fn max_attempts(&self) -> u32 {
        self.policy.max_attempts
    }
}
