//! Backoff Controller: pacing between trades and pauses after failures.

use std::time::Duration;

use super::random::RandomSource;
use super::settings::Settings;
use crate::exchanges::FailureKind;

/// Delay growth per consecutive failure.
const FAILURE_FACTOR: f64 = 0.5;

/// Pacing parameters.
#[derive(Debug, Clone)]
pub struct Backoff {
    /// Failures from which a cooldown is inserted before the next attempt.
    pub cooldown_threshold: u32,
    /// Cooldown per consecutive failure.
    pub cooldown_step: Duration,
    pub max_cooldown: Duration,
    /// Fixed pause after a rate-limit error, replacing the normal delay.
    pub rate_limit_pause: Duration,
    /// Extra pause after an unclassified error.
    pub error_pause: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            cooldown_threshold: 3,
            cooldown_step: Duration::from_secs(2),
            max_cooldown: Duration::from_secs(30),
            rate_limit_pause: Duration::from_secs(10),
            error_pause: Duration::from_secs(5),
        }
    }
}

impl Backoff {
    /// Random delay in the trade frequency range, stretched by
    /// `1 + 0.5 * failures`.
    pub fn next_delay(
        &self,
        settings: &Settings,
        consecutive_failures: u32,
        random: &mut dyn RandomSource,
    ) -> Duration {
        let base = random
            .uniform(settings.trade_frequency_min, settings.trade_frequency_max)
            .max(0.0);
        let factor = 1.0 + FAILURE_FACTOR * consecutive_failures as f64;
        Duration::try_from_secs_f64(base * factor).unwrap_or(self.max_cooldown)
    }

    /// Cooldown before the next attempt: `min(max, failures * step)` once
    /// the threshold is reached.
    pub fn cooldown(&self, consecutive_failures: u32) -> Option<Duration> {
        if consecutive_failures < self.cooldown_threshold {
            return None;
        }
        Some(
            self.cooldown_step
                .saturating_mul(consecutive_failures)
                .min(self.max_cooldown),
        )
    }

    /// Cooldown before the next attempt given how the previous one ended.
    ///
    /// A rate limit is answered by its fixed pause alone.
    pub fn cooldown_after(
        &self,
        previous: Option<FailureKind>,
        consecutive_failures: u32,
    ) -> Option<Duration> {
        match previous {
            Some(FailureKind::RateLimited) => None,
            _ => self.cooldown(consecutive_failures),
        }
    }

    /// Delay after an attempt that ended with `failure`, if any.
    pub fn delay_after(
        &self,
        failure: Option<FailureKind>,
        settings: &Settings,
        consecutive_failures: u32,
        random: &mut dyn RandomSource,
    ) -> Duration {
        match failure {
            Some(FailureKind::RateLimited) => self.rate_limit_pause,
            Some(FailureKind::Unknown) => {
                self.next_delay(settings, consecutive_failures, random) + self.error_pause
            }
            _ => self.next_delay(settings, consecutive_failures, random),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booster::random::FixedRandom;

    fn settings(min: f64, max: f64) -> Settings {
        Settings {
            trade_frequency_min: min,
            trade_frequency_max: max,
            ..Settings::default()
        }
    }

    #[test]
    fn test_no_failures_uses_frequency_draw() {
        let backoff = Backoff::default();
        let delay = backoff.next_delay(&settings(1.0, 5.0), 0, &mut FixedRandom::buy(2.0));
        assert_eq!(delay, Duration::from_secs(2));
    }

    #[test]
    fn test_three_failures_cooldown_and_delay() {
        let backoff = Backoff::default();
        let s = settings(1.0, 1.0);

        assert_eq!(backoff.cooldown(3), Some(Duration::from_secs(6)));
        assert_eq!(
            backoff.next_delay(&s, 3, &mut FixedRandom::buy(1.0)),
            Duration::from_millis(2500)
        );
    }

    #[test]
    fn test_cooldown_below_threshold_and_capped() {
        let backoff = Backoff::default();
        assert_eq!(backoff.cooldown(0), None);
        assert_eq!(backoff.cooldown(2), None);
        assert_eq!(backoff.cooldown(20), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_rate_limit_overrides_delay() {
        let backoff = Backoff::default();
        let delay = backoff.delay_after(
            Some(FailureKind::RateLimited),
            &settings(1.0, 1.0),
            5,
            &mut FixedRandom::buy(1.0),
        );
        assert_eq!(delay, Duration::from_secs(10));
    }

    #[test]
    fn test_rate_limit_skips_cooldown() {
        let backoff = Backoff::default();
        assert_eq!(backoff.cooldown_after(Some(FailureKind::RateLimited), 5), None);
        assert_eq!(
            backoff.cooldown_after(Some(FailureKind::Unknown), 5),
            Some(Duration::from_secs(10))
        );
        assert_eq!(backoff.cooldown_after(None, 3), Some(Duration::from_secs(6)));
    }

    #[test]
    fn test_unknown_error_adds_pause() {
        let backoff = Backoff::default();
        let delay = backoff.delay_after(
            Some(FailureKind::Unknown),
            &settings(1.0, 1.0),
            1,
            &mut FixedRandom::buy(1.0),
        );
        assert_eq!(delay, Duration::from_millis(6500));
    }

    #[test]
    fn test_inverted_frequency_range_is_tolerated() {
        let backoff = Backoff::default();
        let delay = backoff.next_delay(&settings(5.0, 1.0), 0, &mut FixedRandom::buy(9.0));
        assert_eq!(delay, Duration::from_secs(5));
    }
}
