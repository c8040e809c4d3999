//! Exponential reconnection backoff.

use std::time::Duration;

/// Configuration for automatic reconnection.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnect attempt.
    ///
    /// Default: 1 second
    pub initial_delay: Duration,

    /// Factor applied to the delay after every failed or closed attempt.
    ///
    /// Default: 1.5
    pub multiplier: f64,

    /// Upper bound for the delay.
    ///
    /// Default: 30 seconds
    pub max_delay: Duration,

    /// Consecutive failures tolerated before giving up. `None` retries forever.
    ///
    /// Default: None
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            multiplier: 1.5,
            max_delay: Duration::from_secs(30),
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Set the initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the backoff multiplier.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Set the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Limit the number of consecutive failed attempts.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }
}

/// What to do after a failed or closed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffDecision {
    /// Schedule another attempt after the given delay.
    Retry(Duration),
    /// Attempts exhausted; the connection becomes `Failed`.
    GiveUp,
}

/// Mutable backoff cursor owned by one socket client.
///
/// The delay handed out for a failure is the current delay; the cursor then
/// advances to `min(current × multiplier, max_delay)`. After *i* consecutive
/// failures [`Backoff::current_delay`] therefore equals
/// `min(initial × multiplier^i, max_delay)`.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: ReconnectPolicy,
    current: Duration,
    attempts: u32,
}

impl Backoff {
    pub fn new(policy: ReconnectPolicy) -> Self {
        let current = policy.initial_delay;
        Self {
            policy,
            current,
            attempts: 0,
        }
    }

    /// Consecutive failures since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay that the next failure will schedule.
    pub fn current_delay(&self) -> Duration {
        self.current
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// Records a failed or closed attempt and decides what happens next.
    pub fn record_failure(&mut self) -> BackoffDecision {
        self.attempts = self.attempts.saturating_add(1);

        if let Some(max) = self.policy.max_attempts {
            if self.attempts > max {
                return BackoffDecision::GiveUp;
            }
        }

        let scheduled = self.current;
        self.current = self.advance(self.current);
        BackoffDecision::Retry(scheduled)
    }

    /// Successful open: attempts and delay go back to their initial values.
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.current = self.policy.initial_delay;
    }

    fn advance(&self, delay: Duration) -> Duration {
        let max = self.policy.max_delay.as_secs_f64();
        let next = (delay.as_secs_f64() * self.policy.multiplier)
            .min(max)
            .max(0.0);
        Duration::from_secs_f64(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn millis(d: Duration) -> f64 {
        d.as_secs_f64() * 1000.0
    }

    #[test]
    fn defaults_match_documented_values() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.initial_delay, Duration::from_secs(1));
        assert_eq!(policy.multiplier, 1.5);
        assert_eq!(policy.max_delay, Duration::from_secs(30));
        assert_eq!(policy.max_attempts, None);
    }

    #[test]
    fn first_failure_schedules_initial_delay() {
        let mut backoff = Backoff::new(ReconnectPolicy::default());
        assert_eq!(
            backoff.record_failure(),
            BackoffDecision::Retry(Duration::from_secs(1))
        );
        assert_eq!(backoff.current_delay(), Duration::from_millis(1500));
    }

    #[test]
    fn reset_restores_initial_delay() {
        let mut backoff = Backoff::new(ReconnectPolicy::default());
        for _ in 0..6 {
            backoff.record_failure();
        }
        backoff.reset();
        assert_eq!(backoff.attempts(), 0);
        assert_eq!(
            backoff.record_failure(),
            BackoffDecision::Retry(Duration::from_secs(1))
        );
    }

    #[test]
    fn gives_up_only_after_exceeding_max_attempts() {
        let mut backoff = Backoff::new(ReconnectPolicy::default().with_max_attempts(2));
        assert!(matches!(backoff.record_failure(), BackoffDecision::Retry(_)));
        assert!(matches!(backoff.record_failure(), BackoffDecision::Retry(_)));
        assert_eq!(backoff.record_failure(), BackoffDecision::GiveUp);
    }

    #[test]
    fn nan_multiplier_falls_back_to_max_delay() {
        let mut backoff = Backoff::new(ReconnectPolicy::default().with_multiplier(f64::NAN));
        backoff.record_failure();
        assert_eq!(backoff.current_delay(), Duration::from_secs(30));
    }

    proptest! {
        #[test]
        fn delay_after_i_failures_is_capped_geometric(i in 0u32..40) {
            let mut backoff = Backoff::new(ReconnectPolicy::default());
            for _ in 0..i {
                backoff.record_failure();
            }
            let expected = (1000.0 * 1.5f64.powi(i as i32)).min(30_000.0);
            prop_assert!((millis(backoff.current_delay()) - expected).abs() < 1.0);
        }

        #[test]
        fn delay_never_exceeds_max(
            initial_ms in 1u64..5_000,
            multiplier in 1.0f64..4.0,
            max_ms in 5_000u64..60_000,
            failures in 0usize..64,
        ) {
            let policy = ReconnectPolicy::default()
                .with_initial_delay(Duration::from_millis(initial_ms))
                .with_multiplier(multiplier)
                .with_max_delay(Duration::from_millis(max_ms));
            let mut backoff = Backoff::new(policy);
            for _ in 0..failures {
                if let BackoffDecision::Retry(delay) = backoff.record_failure() {
                    prop_assert!(delay <= Duration::from_millis(max_ms));
                }
            }
        }
    }
}
