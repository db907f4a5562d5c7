//! Bounded-retry start-up supervisor.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::Booster;
use super::error::BoosterError;
use crate::config::RetryConfig;

/// Exponential backoff between start attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Builds a policy from the `engine.retry` section; unset values keep
    /// their defaults.
    pub fn from_config(config: Option<&RetryConfig>) -> Self {
        let defaults = Self::default();
        let Some(config) = config else {
            return defaults;
        };

        Self {
            max_attempts: config.max_attempts.filter(|n| *n > 0).unwrap_or(defaults.max_attempts),
            initial_delay: if config.initial_delay.is_zero() {
                defaults.initial_delay
            } else {
                config.initial_delay
            },
            max_delay: if config.max_delay.is_zero() {
                defaults.max_delay
            } else {
                config.max_delay
            },
            multiplier: config.multiplier.unwrap_or(defaults.multiplier),
        }
    }

    /// Delay after failed attempt `n` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(attempt.min(i32::MAX as u32) as i32);
        let secs = self.initial_delay.as_secs_f64() * factor;
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// How supervision ended.
#[derive(Debug)]
pub enum SupervisorOutcome {
    Started { attempts: u32 },
    GaveUp { attempts: u32, last_error: BoosterError },
    /// Error that no retry can fix.
    Fatal(BoosterError),
    Cancelled,
}

/// Starts the booster, retrying transient failures.
pub struct Supervisor {
    retry: RetryPolicy,
}

impl Supervisor {
    pub fn new(retry: RetryPolicy) -> Self {
        Self { retry }
    }

    pub async fn run(&self, booster: &Booster, cancel: &CancellationToken) -> SupervisorOutcome {
        let mut attempt = 0;

        loop {
            if cancel.is_cancelled() {
                return SupervisorOutcome::Cancelled;
            }
            attempt += 1;

            let err = match booster.try_start().await {
                Ok(()) => {
                    info!(attempts = attempt, "Volume booster started");
                    return SupervisorOutcome::Started { attempts: attempt };
                }
                Err(e) => e,
            };

            if !err.is_retryable() {
                warn!(error = %err, "Volume booster cannot start");
                return SupervisorOutcome::Fatal(err);
            }

            if attempt >= self.retry.max_attempts {
                warn!(attempts = attempt, error = %err, "Giving up on starting volume booster");
                return SupervisorOutcome::GaveUp {
                    attempts: attempt,
                    last_error: err,
                };
            }

            let delay = self.retry.delay(attempt - 1);
            warn!(
                attempt,
                max_attempts = self.retry.max_attempts,
                retry_in = ?delay,
                error = %err,
                "Volume booster start failed, retrying"
            );

            tokio::select! {
                _ = cancel.cancelled() => return SupervisorOutcome::Cancelled,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
