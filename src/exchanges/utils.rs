//! Common utilities for exchange implementations.

use rust_decimal::{Decimal, RoundingStrategy};

/// Converts "BTC/USDT" to "BTC_USDT".
pub fn symbol_to_market_id(symbol: &str) -> String {
    symbol.replace('/', "_")
}

/// Rounds a quantity to the exchange's amount precision (decimal places).
///
/// Midpoints round away from zero. A missing precision leaves the value as is.
pub fn round_to_precision(quantity: Decimal, precision: Option<u32>) -> Decimal {
    match precision {
        Some(dp) => quantity.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
        None => quantity,
    }
}

/// Truncates a quantity to the amount precision, never rounding up.
pub fn truncate_to_precision(quantity: Decimal, precision: Option<u32>) -> Decimal {
    match precision {
        Some(dp) => quantity.round_dp_with_strategy(dp, RoundingStrategy::ToZero),
        None => quantity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_to_market_id() {
        assert_eq!(symbol_to_market_id("BTC/USDT"), "BTC_USDT");
        assert_eq!(symbol_to_market_id("ETHUSDT"), "ETHUSDT");
    }

    #[test]
    fn test_round_to_precision() {
        let q = Decimal::new(123456, 6); // 0.123456
        assert_eq!(round_to_precision(q, Some(5)), Decimal::new(12346, 5));
        assert_eq!(round_to_precision(q, Some(2)), Decimal::new(12, 2));
        assert_eq!(round_to_precision(q, None), q);
    }

    #[test]
    fn test_round_to_precision_zero_places() {
        assert_eq!(round_to_precision(Decimal::new(25, 1), Some(0)), Decimal::from(3));
    }

    #[test]
    fn test_truncate_to_precision() {
        let q = Decimal::new(123456, 6);
        assert_eq!(truncate_to_precision(q, Some(5)), Decimal::new(12345, 5));
        assert_eq!(truncate_to_precision(q, None), q);
    }
}
