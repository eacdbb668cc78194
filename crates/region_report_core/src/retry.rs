use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);
const MAX_BACKOFF_EXPONENT: u32 = 6;

/// Bounded exponential backoff: attempt `n` (1-based) that fails waits
/// `base_delay * 2^(n-1)` before attempt `n + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Policy with no waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
        }
    }

    /// At least one attempt is always made.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay after the failed `attempt`, or `None` when it was the last one.
    pub fn backoff_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.attempts() {
            return None;
        }
        let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
        Some(self.base_delay.saturating_mul(1 << exponent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_doubles_delay_until_exhausted() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_after(1), Some(Duration::from_millis(500)));
        assert_eq!(policy.backoff_after(2), Some(Duration::from_millis(1_000)));
        assert_eq!(policy.backoff_after(3), None);
    }

    #[test]
    fn zero_attempts_still_allows_one() {
        let policy = RetryPolicy::immediate(0);
        assert_eq!(policy.attempts(), 1);
        assert_eq!(policy.backoff_after(1), None);
    }

    #[test]
    fn backoff_exponent_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 100,
            base_delay: Duration::from_millis(10),
        };
        assert_eq!(policy.backoff_after(50), Some(Duration::from_millis(640)));
    }
}
