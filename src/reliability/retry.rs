use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Delay of the second retry; later retries double it.
    #[serde(with = "crate::app::config::serde_helpers::millis")]
    pub base_delay: Duration,
    /// Ceiling: once the next delay would exceed it the entry is abandoned.
    #[serde(with = "crate::app::config::serde_helpers::millis")]
    pub max_delay: Duration,
    pub jitter: bool,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            jitter: false,
        }
    }
}

/// Exponential backoff state for one publish worker.
///
/// The multiplier starts at zero, so the first retry of an entry happens
/// immediately; after that it goes 1, 2, 4, … times `base_delay`. The
/// worker resets it after every successful publish and every abandoned
/// entry.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    multiplier: u32,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            multiplier: 0,
        }
    }

    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }

    pub fn multiplier(&self) -> u32 {
        self.multiplier
    }

    /// Delay before the next retry, or `None` once the ceiling is exceeded.
    /// Advances the multiplier when a delay is returned.
    pub fn next_delay(&mut self) -> Option<Duration> {
        let delay = self.config.base_delay.checked_mul(self.multiplier)?;
        if delay > self.config.max_delay {
            return None;
        }

        self.multiplier = match self.multiplier {
            0 => 1,
            m => m.saturating_mul(2),
        };

        if self.config.jitter {
            Some(apply_jitter(delay).min(self.config.max_delay))
        } else {
            Some(delay)
        }
    }

    pub fn reset(&mut self) {
        self.multiplier = 0;
    }
}

fn apply_jitter(delay: Duration) -> Duration {
    if delay.is_zero() {
        return delay;
    }
    let mut rng = rand::rng();
    let jitter_factor = rng.random_range(0.5..1.5); // ±50% jitter
    Duration::from_secs_f64(delay.as_secs_f64() * jitter_factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backoff(base_ms: u64, max_ms: u64) -> Backoff {
        Backoff::new(BackoffConfig {
            base_delay: Duration::from_millis(base_ms),
            max_delay: Duration::from_millis(max_ms),
            jitter: false,
        })
    }

    #[test]
    fn test_doubling_sequence_until_ceiling() {
        let mut backoff = backoff(1000, 5000);
        let delays: Vec<_> = std::iter::from_fn(|| backoff.next_delay()).collect();

        assert_eq!(
            delays,
            vec![
                Duration::ZERO,
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
            ]
        );
    }

    #[test]
    fn test_ceiling_is_inclusive() {
        let mut backoff = backoff(100, 400);
        let delays: Vec<_> = std::iter::from_fn(|| backoff.next_delay()).collect();
        assert_eq!(delays.last(), Some(&Duration::from_millis(400)));
    }

    #[test]
    fn test_reset_returns_to_baseline() {
        let mut backoff = backoff(100, 10_000);
        backoff.next_delay();
        backoff.next_delay();
        backoff.next_delay();
        assert_eq!(backoff.multiplier(), 4);

        backoff.reset();
        assert_eq!(backoff.next_delay(), Some(Duration::ZERO));
    }

    #[test]
    fn test_zero_ceiling_allows_only_immediate_retry() {
        let mut backoff = backoff(100, 0);
        assert_eq!(backoff.next_delay(), Some(Duration::ZERO));
        assert_eq!(backoff.next_delay(), None);
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let mut backoff = Backoff::new(BackoffConfig {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            jitter: true,
        });
        assert_eq!(backoff.next_delay(), Some(Duration::ZERO));
        let delay = backoff.next_delay().unwrap();
        assert!(delay >= Duration::from_millis(50));
        assert!(delay <= Duration::from_millis(150));
    }

    #[test]
    fn test_jitter_never_passes_ceiling() {
        for _ in 0..200 {
            let mut backoff = Backoff::new(BackoffConfig {
                base_delay: Duration::from_millis(100),
                max_delay: Duration::from_millis(200),
                jitter: true,
            });
            let delays: Vec<_> = std::iter::from_fn(|| backoff.next_delay()).collect();
            assert_eq!(delays.len(), 3);
            assert!(delays.iter().all(|d| *d <= Duration::from_millis(200)));
        }
    }
}
