//! Bounded exponential backoff for lock acquisition.

use std::time::Duration;

use tokio::time::Instant;

/// Default number of lock attempts per request
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// Default delay before the second attempt
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(50);
/// Default upper bound on a single delay
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(1);

/// How often and how patiently a lock attempt is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero is treated as one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes a single attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = self.multiplier.max(1).saturating_pow(exponent);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Delay before the next attempt, or `None` when no attempt should follow.
    ///
    /// Stops once `max_attempts` is used up, and also when sleeping would
    /// carry past `deadline`.
    pub fn next_delay(&self, attempt: u32, deadline: Option<Instant>) -> Option<Duration> {
        if attempt >= self.max_attempts.max(1) {
            return None;
        }
        let delay = self.backoff(attempt);
        match deadline {
            Some(deadline) if Instant::now() + delay >= deadline => None,
            _ => Some(delay),
        }
    }
}
