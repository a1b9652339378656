//! Retry policy for node execution.

use std::time::Duration;

/// Retry policy for handling transient node failures.
#[derive(Debug, Clone)]
pub enum RetryPolicy {
    /// No retry - fail immediately on error.
    None,
    /// Fixed interval retry.
    Fixed { max_attempts: usize, interval: Duration },
    /// Exponential backoff retry.
    Exponential {
        max_attempts: usize,
        initial_interval: Duration,
        max_interval: Duration,
        multiplier: f64,
    },
}

impl RetryPolicy {
    pub fn none() -> Self {
        RetryPolicy::None
    }

    pub fn fixed(max_attempts: usize, interval: Duration) -> Self {
        RetryPolicy::Fixed { max_attempts, interval }
    }

    pub fn exponential(max_attempts: usize, initial_interval: Duration, max_interval: Duration, multiplier: f64) -> Self {
        RetryPolicy::Exponential { max_attempts, initial_interval, max_interval, multiplier }
    }

    pub fn should_retry(&self, attempt: usize) -> bool {
        match self {
            RetryPolicy::None => false,
            RetryPolicy::Fixed { max_attempts, .. } => attempt < *max_attempts,
            RetryPolicy::Exponential { max_attempts, .. } => attempt < *max_attempts,
        }
    }

    pub fn delay(&self, attempt: usize) -> Duration {
        match self {
            RetryPolicy::None => Duration::ZERO,
            RetryPolicy::Fixed { interval, .. } => *interval,
            RetryPolicy::Exponential { initial_interval, max_interval, multiplier, .. } => {
                let delay_secs = initial_interval.as_secs_f64() * multiplier.powi(attempt as i32);
                Duration::from_secs_f64(delay_secs).min(*max_interval)
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::None
    }
}

/// The LLM Provider Registry's retry policy (§4.1): exponential backoff,
/// base 1s, cap 30s, up to 3 attempts.
pub fn provider_retry_policy() -> RetryPolicy {
    RetryPolicy::exponential(3, Duration::from_secs(1), Duration::from_secs(30), 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_retry_policy_caps_delay_at_30s() {
        let policy = provider_retry_policy();
        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.delay(1), Duration::from_secs(2));
        assert_eq!(policy.delay(2), Duration::from_secs(4));
        assert!(policy.delay(10) <= Duration::from_secs(30));
    }

    #[test]
    fn retry_policy_none_never_retries() {
        assert!(!RetryPolicy::none().should_retry(0));
    }
}
