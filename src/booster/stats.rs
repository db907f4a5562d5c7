//! Session statistics for the booster.

use chrono::{DateTime, Utc};

/// Order counters of the current session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    /// Orders the trading facade accepted.
    pub orders_placed: u64,
    pub successful_orders: u64,
    pub failed_orders: u64,
    /// Reset to zero by any success.
    pub consecutive_failures: u32,
    pub last_failure_at: Option<DateTime<Utc>>,
    /// Completed passes over the symbol list.
    pub cycles: u64,
    /// Attempts skipped for missing data, dust size or balance.
    pub skipped_attempts: u64,
}

impl Stats {
    /// successful_orders / orders_placed, 0 when nothing was placed.
    pub fn success_rate(&self) -> f64 {
        if self.orders_placed == 0 {
            return 0.0;
        }
        self.successful_orders as f64 / self.orders_placed as f64
    }

    pub(crate) fn record_success(&mut self) {
        self.successful_orders += 1;
        self.consecutive_failures = 0;
    }

    pub(crate) fn record_failure(&mut self) {
        self.failed_orders += 1;
        self.consecutive_failures += 1;
        self.last_failure_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate_without_orders() {
        assert_eq!(Stats::default().success_rate(), 0.0);
    }

    #[test]
    fn test_success_resets_consecutive_failures() {
        let mut stats = Stats::default();
        stats.record_failure();
        stats.record_failure();
        assert_eq!(stats.consecutive_failures, 2);
        assert!(stats.last_failure_at.is_some());

        stats.record_success();
        assert_eq!(stats.consecutive_failures, 0);
        assert_eq!(stats.failed_orders, 2);
        assert_eq!(stats.successful_orders, 1);
    }

    #[test]
    fn test_success_rate() {
        let stats = Stats {
            orders_placed: 4,
            successful_orders: 3,
            ..Stats::default()
        };
        assert_eq!(stats.success_rate(), 0.75);
    }
}
