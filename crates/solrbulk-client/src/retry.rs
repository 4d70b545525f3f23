//! Backoff policies for transient network errors.

use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoffBuilder;

use solrbulk_types::{RetryOptions, RetryStrategy};

/// Longest single wait between two attempts.
const MAX_INTERVAL: Duration = Duration::from_secs(60);

/// Waits grow by a fixed step: step, 2 * step, 3 * step, ...
#[derive(Debug, Clone)]
pub struct LinearBackoff {
    step: Duration,
    current: Duration,
    max_interval: Duration,
}

impl LinearBackoff {
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            current: Duration::ZERO,
            max_interval: MAX_INTERVAL,
        }
    }

    pub fn with_max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = max_interval;
        self
    }
}

impl Backoff for LinearBackoff {
    fn reset(&mut self) {
        self.current = Duration::ZERO;
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        self.current = (self.current + self.step).min(self.max_interval);
        Some(self.current)
    }
}

/// Build the backoff for a retry policy.
///
/// The attempt bound is enforced by the caller through `max_retries`; the
/// returned policy never gives up on its own.
pub fn backoff_for(retry: &RetryOptions) -> Box<dyn Backoff + Send> {
    match retry.strategy {
        RetryStrategy::Linear => Box::new(LinearBackoff::new(retry.wait)),
        RetryStrategy::Exponential => Box::new(
            ExponentialBackoffBuilder::new()
                .with_initial_interval(retry.wait)
                .with_max_interval(MAX_INTERVAL)
                .with_max_elapsed_time(None)
                .build(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_backoff_steps() {
        let mut backoff = LinearBackoff::new(Duration::from_millis(100));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(100)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(200)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(300)));

        backoff.reset();
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_linear_backoff_capped() {
        let mut backoff =
            LinearBackoff::new(Duration::from_secs(1)).with_max_interval(Duration::from_secs(2));
        backoff.next_backoff();
        backoff.next_backoff();
        assert_eq!(backoff.next_backoff(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_exponential_never_gives_up() {
        let retry = RetryOptions {
            max_retries: 100,
            wait: Duration::from_millis(10),
            strategy: RetryStrategy::Exponential,
        };
        let mut backoff = backoff_for(&retry);
        for _ in 0..50 {
            let wait = backoff.next_backoff().unwrap();
            assert!(wait <= MAX_INTERVAL + MAX_INTERVAL / 2);
        }
    }

    #[test]
    fn test_linear_strategy_selected() {
        let retry = RetryOptions {
            max_retries: 3,
            wait: Duration::from_millis(5),
            strategy: RetryStrategy::Linear,
        };
        let mut backoff = backoff_for(&retry);
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(5)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(10)));
    }
}
