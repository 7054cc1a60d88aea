use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Bounded exponential backoff policy for transient backend failures.
///
/// Only transient failures are retried; verdicts and permanent errors never
/// re-enter this path.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the initial attempt before giving up.
    pub max_retries: u8,
    /// Base delay for the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound on any single delay, in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 250,
            max_delay_ms: 10_000,
        }
    }
}

impl RetryPolicy {
    /// Whether another retry is allowed after `attempt` failed tries.
    pub fn allows(&self, attempt: u8) -> bool {
        attempt <= self.max_retries
    }

    /// Delay before the given 1-based retry attempt.
    ///
    /// Formula: `min(base_ms * 2^(attempt-1) + jitter, max_ms)` (0-25% jitter).
    pub fn backoff(&self, attempt: u8) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let exp_factor = 2u64.saturating_pow((attempt - 1) as u32);
        let delay_ms = self.base_delay_ms.saturating_mul(exp_factor);

        let jitter = if delay_ms > 0 {
            rand::rng().random_range(0..=delay_ms / 4)
        } else {
            0
        };

        let total_delay = delay_ms.saturating_add(jitter).min(self.max_delay_ms);
        Duration::from_millis(total_delay)
    }
}

/// A single retry attempt record, kept for the failure summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryAttempt {
    /// 1-based attempt number.
    pub attempt: u8,
    /// Error message from the failed attempt.
    pub error: String,
    /// When this attempt occurred.
    pub timestamp: DateTime<Utc>,
}

impl RetryAttempt {
    pub fn new(attempt: u8, error: impl Into<String>) -> Self {
        Self {
            attempt,
            error: error.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 60_000,
        }
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let p = policy();

        // Attempt 1: base * 2^0 = base
        let d1 = p.backoff(1);
        assert!(d1.as_millis() >= 1000 && d1.as_millis() <= 1250);

        // Attempt 2: base * 2^1 = 2*base
        let d2 = p.backoff(2);
        assert!(d2.as_millis() >= 2000 && d2.as_millis() <= 2500);

        // Attempt 3: base * 2^2 = 4*base
        let d3 = p.backoff(3);
        assert!(d3.as_millis() >= 4000 && d3.as_millis() <= 5000);
    }

    #[test]
    fn test_backoff_respects_max() {
        let p = RetryPolicy {
            max_retries: 10,
            base_delay_ms: 10_000,
            max_delay_ms: 60_000,
        };
        // Uncapped attempt 10 would be 10000 * 512 ms
        assert!(p.backoff(10).as_millis() <= 60_000);
    }

    #[test]
    fn test_backoff_zero_attempt() {
        assert_eq!(policy().backoff(0), Duration::ZERO);
    }

    #[test]
    fn test_allows_up_to_ceiling() {
        let p = policy();
        assert!(p.allows(1));
        assert!(p.allows(3));
        assert!(!p.allows(4));
    }

    #[test]
    fn test_attempt_history_records_order() {
        let history: Vec<RetryAttempt> = (1..=3)
            .map(|n| RetryAttempt::new(n, format!("error {n}")))
            .collect();
        assert_eq!(history[0].attempt, 1);
        assert_eq!(history[2].attempt, 3);
        assert_eq!(history[2].error, "error 3");
    }
}
