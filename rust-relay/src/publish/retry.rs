//! Exponential backoff schedule for outbound publishing.

use std::time::Duration;

use rand::Rng;

use crate::config::RetryPolicy;

impl RetryPolicy {
    /// Un-jittered delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Delay to actually wait before retry number `retry`.
    ///
    /// Applies ±10% jitter, honours a server-provided `Retry-After` as a
    /// floor, and never exceeds `max_delay`.
    pub fn next_delay(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        let factor: f64 = rand::thread_rng().gen_range(0.9..=1.1);
        let jittered = self.delay_for(retry).mul_f64(factor);

        jittered
            .max(retry_after.unwrap_or_default())
            .min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(3000),
        }
    }

    #[test]
    fn test_delay_doubles_until_cap() {
        let policy = policy();
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(4), Duration::from_millis(3000));
        assert_eq!(policy.delay_for(40), Duration::from_millis(3000));
    }

    #[test]
    fn test_default_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert!(policy.delay_for(2) > policy.delay_for(1));
    }

    #[test]
    fn test_jitter_bounds() {
        let policy = policy();
        for _ in 0..100 {
            let delay = policy.next_delay(2, None);
            assert!(delay >= Duration::from_millis(900), "{:?} too short", delay);
            assert!(delay <= Duration::from_millis(1100), "{:?} too long", delay);
        }
    }

    #[test]
    fn test_retry_after_is_a_floor_within_cap() {
        let policy = policy();
        assert_eq!(
            policy.next_delay(1, Some(Duration::from_secs(2))),
            Duration::from_secs(2)
        );
        assert_eq!(
            policy.next_delay(1, Some(Duration::from_secs(60))),
            Duration::from_millis(3000)
        );
    }
}
