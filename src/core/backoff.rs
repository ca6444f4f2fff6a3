//! Exponential backoff for transport reconnects.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
#[error("maximum reconnect attempts exceeded: {0}")]
pub struct AttemptsExhausted(pub u32);

/// Grows the delay geometrically up to a cap, counting attempts against an
/// optional limit. Reset on every successful connection.
#[derive(Debug)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    multiplier: f64,
    /// 0 means retry forever.
    max_attempts: u32,
    current: Duration,
    attempts: u32,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration, multiplier: f64, max_attempts: u32) -> Self {
        Self {
            initial,
            max,
            multiplier,
            max_attempts,
            current: initial,
            attempts: 0,
        }
    }

    /// Back to the initial delay, attempt counter cleared.
    pub fn reset(&mut self) {
        self.current = self.initial;
        self.attempts = 0;
    }

    /// The delay to sleep before the next attempt, or an error once the
    /// attempt limit is exceeded.
    pub fn next_sleep(&mut self) -> Result<Duration, AttemptsExhausted> {
        self.attempts += 1;
        if self.max_attempts > 0 && self.attempts > self.max_attempts {
            return Err(AttemptsExhausted(self.max_attempts));
        }
        let sleep = self.current;
        self.current = self
            .current
            .mul_f64(self.multiplier)
            .min(self.max);
        Ok(sleep)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_delay_grows_geometrically() {
        let mut backoff = Backoff::new(secs(5), secs(300), 2.0, 0);
        assert_eq!(backoff.next_sleep().unwrap(), secs(5));
        assert_eq!(backoff.next_sleep().unwrap(), secs(10));
        assert_eq!(backoff.next_sleep().unwrap(), secs(20));
    }

    #[test]
    fn test_delay_caps_at_max() {
        let mut backoff = Backoff::new(secs(100), secs(150), 2.0, 0);
        assert_eq!(backoff.next_sleep().unwrap(), secs(100));
        assert_eq!(backoff.next_sleep().unwrap(), secs(150));
        assert_eq!(backoff.next_sleep().unwrap(), secs(150));
    }

    #[test]
    fn test_attempt_limit() {
        let mut backoff = Backoff::new(secs(1), secs(10), 2.0, 2);
        assert!(backoff.next_sleep().is_ok());
        assert!(backoff.next_sleep().is_ok());
        let err = backoff.next_sleep().unwrap_err();
        assert_eq!(err.0, 2);
    }

    #[test]
    fn test_zero_limit_means_unlimited() {
        let mut backoff = Backoff::new(secs(1), secs(1), 1.0, 0);
        for _ in 0..100 {
            assert!(backoff.next_sleep().is_ok());
        }
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut backoff = Backoff::new(secs(5), secs(300), 2.0, 3);
        backoff.next_sleep().unwrap();
        backoff.next_sleep().unwrap();
        backoff.reset();
        assert_eq!(backoff.attempts(), 0);
        assert_eq!(backoff.next_sleep().unwrap(), secs(5));
    }
}
