//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

use crate::config::RetryConfig;

/// Fraction of the computed delay that jitter may add or remove.
pub const JITTER_RATIO: f64 = 0.25;

/// Calculate the delay after the `attempt`-th failure (1-based).
///
/// `min(base * multiplier^(attempt-1), max)`, perturbed by up to ±25% when
/// jitter is enabled and never negative.
pub fn calculate_backoff(attempt: u32, config: &RetryConfig) -> Duration {
    if config.jitter {
        calculate_backoff_with(attempt, config, &mut rand::thread_rng())
    } else {
        Duration::from_millis(base_delay_ms(attempt, config).round() as u64)
    }
}

/// Same as [`calculate_backoff`] with a caller-supplied random source.
pub fn calculate_backoff_with<R: Rng>(
    attempt: u32,
    config: &RetryConfig,
    rng: &mut R,
) -> Duration {
    let mut delay_ms = base_delay_ms(attempt, config);
    if config.jitter {
        let spread = delay_ms * JITTER_RATIO;
        if spread > 0.0 {
            delay_ms += rng.gen_range(-spread..=spread);
        }
    }
    Duration::from_millis(delay_ms.max(0.0).round() as u64)
}

fn base_delay_ms(attempt: u32, config: &RetryConfig) -> f64 {
    if attempt == 0 {
        return 0.0;
    }
    let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
    let delay = config.base_delay_ms as f64 * config.backoff_multiplier.powi(exponent);
    delay.min(config.max_delay_ms as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config(jitter: bool) -> RetryConfig {
        RetryConfig {
            max_attempts: 5,
            base_delay_ms: 1_000,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
            jitter,
        }
    }

    #[test]
    fn test_backoff_calculation() {
        let c = config(false);
        assert_eq!(calculate_backoff(0, &c), Duration::ZERO);
        assert_eq!(calculate_backoff(1, &c), Duration::from_millis(1_000));
        assert_eq!(calculate_backoff(2, &c), Duration::from_millis(2_000));
        assert_eq!(calculate_backoff(3, &c), Duration::from_millis(4_000));
        assert_eq!(calculate_backoff(4, &c), Duration::from_millis(8_000));
    }

    #[test]
    fn test_backoff_is_capped() {
        let c = config(false);
        assert_eq!(calculate_backoff(5, &c), Duration::from_millis(10_000));
        assert_eq!(calculate_backoff(u32::MAX, &c), Duration::from_millis(10_000));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let c = config(true);
        let mut rng = StdRng::seed_from_u64(7);
        let mut saw_below = false;
        let mut saw_above = false;

        for _ in 0..1_000 {
            let delay = calculate_backoff_with(2, &c, &mut rng).as_millis();
            assert!((1_500..=2_500).contains(&delay), "delay {} out of bounds", delay);
            saw_below |= delay < 2_000;
            saw_above |= delay > 2_000;
        }
        assert!(saw_below && saw_above);
    }

    #[test]
    fn test_jitter_with_zero_base() {
        let mut c = config(true);
        c.base_delay_ms = 0;
        assert_eq!(calculate_backoff(3, &c), Duration::ZERO);
    }
}
