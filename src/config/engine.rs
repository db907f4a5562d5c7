//! Engine timing configuration.

use serde::Deserialize;
use std::time::Duration;

use super::duration;

/// Timeouts and intervals of the booster loop.
///
/// Zero durations mean "use the built-in default".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    /// How often the settings snapshot is refreshed (default: 60s).
    #[serde(default, with = "duration")]
    pub config_refresh_interval: Duration,
    /// Bound on price, limits and balance lookups (default: 30s).
    #[serde(default, with = "duration")]
    pub market_data_timeout: Duration,
    /// Bound on order submission (default: 30s).
    #[serde(default, with = "duration")]
    pub order_timeout: Duration,
    /// How long `stop` waits for the loop to unwind (default: 10s).
    #[serde(default, with = "duration")]
    pub shutdown_timeout: Duration,
    /// Start-up retry behavior.
    pub retry: Option<RetryConfig>,
}

/// Retry settings for a failed start.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of start attempts.
    pub max_attempts: Option<u32>,
    /// Delay before the first retry.
    #[serde(default, with = "duration")]
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    #[serde(default, with = "duration")]
    pub max_delay: Duration,
    /// Factor by which delay increases after each retry.
    pub multiplier: Option<f64>,
}
