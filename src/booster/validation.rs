//! Operator-facing checks and planning helpers for booster settings.
//!
//! Unlike [`Settings::normalize`], nothing here corrects values: the report
//! lists what the operator should fix, and the engine keeps running on the
//! normalised snapshot either way.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Value, json};
use std::str::FromStr;
use std::time::Duration;

use super::settings::{
    ENABLED_KEY, MAX_BUY_AMOUNT_KEY, MAX_PRICE_OFFSET_PERCENT, MAX_SELL_AMOUNT_KEY,
    MAX_TRADE_FREQUENCY, MIN_BUY_AMOUNT_KEY, MIN_SELL_AMOUNT_KEY, MIN_TRADE_FREQUENCY,
    ORDER_TYPE_KEY, PRICE_OFFSET_PERCENT_KEY, Settings, TRADE_FREQUENCY_MAX_KEY,
    TRADE_FREQUENCY_MIN_KEY, VOLUME_TARGET_KEY, value_to_decimal, value_to_f64,
};
use crate::config::RawConfig;
use crate::domain::OrderType;

const REQUIRED_KEYS: [&str; 8] = [
    VOLUME_TARGET_KEY,
    ORDER_TYPE_KEY,
    TRADE_FREQUENCY_MIN_KEY,
    TRADE_FREQUENCY_MAX_KEY,
    MIN_BUY_AMOUNT_KEY,
    MAX_BUY_AMOUNT_KEY,
    MIN_SELL_AMOUNT_KEY,
    MAX_SELL_AMOUNT_KEY,
];

const AMOUNT_KEYS: [&str; 4] = [
    MIN_BUY_AMOUNT_KEY,
    MAX_BUY_AMOUNT_KEY,
    MIN_SELL_AMOUNT_KEY,
    MAX_SELL_AMOUNT_KEY,
];

/// Findings of [`validate_raw`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Strict check of raw booster settings.
pub fn validate_raw(raw: &RawConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    for key in REQUIRED_KEYS {
        if raw.get(key).is_none_or(Value::is_null) {
            report
                .errors
                .push(format!("Missing required configuration: {}", key));
        }
    }
    if !report.errors.is_empty() {
        return report;
    }

    let number = |key: &str, report: &mut ValidationReport| -> Option<Decimal> {
        let parsed = raw.get(key).and_then(value_to_decimal);
        if parsed.is_none() {
            report.errors.push(format!("{} must be a number", key));
        }
        parsed
    };

    let target = number(VOLUME_TARGET_KEY, &mut report);
    let freq_min = raw.get(TRADE_FREQUENCY_MIN_KEY).and_then(value_to_f64);
    let freq_max = raw.get(TRADE_FREQUENCY_MAX_KEY).and_then(value_to_f64);
    let amounts: Vec<Option<Decimal>> = AMOUNT_KEYS
        .iter()
        .map(|key| number(*key, &mut report))
        .collect();

    if let (Some(min), Some(max)) = (freq_min, freq_max) {
        if min >= max {
            report.errors.push(format!(
                "{} must be less than {}",
                TRADE_FREQUENCY_MIN_KEY, TRADE_FREQUENCY_MAX_KEY
            ));
        }
        if min < MIN_TRADE_FREQUENCY {
            report.errors.push(format!(
                "{} must be at least {} seconds",
                TRADE_FREQUENCY_MIN_KEY, MIN_TRADE_FREQUENCY
            ));
        }
        if max > MAX_TRADE_FREQUENCY {
            report.errors.push(format!(
                "{} must be at most {} seconds",
                TRADE_FREQUENCY_MAX_KEY, MAX_TRADE_FREQUENCY
            ));
        }
    } else {
        report.errors.push("trade frequencies must be numbers".to_string());
    }

    if let [Some(min_buy), Some(max_buy), Some(min_sell), Some(max_sell)] = amounts[..] {
        if min_buy >= max_buy {
            report.errors.push(format!(
                "{} must be less than {}",
                MIN_BUY_AMOUNT_KEY, MAX_BUY_AMOUNT_KEY
            ));
        }
        if min_sell >= max_sell {
            report.errors.push(format!(
                "{} must be less than {}",
                MIN_SELL_AMOUNT_KEY, MAX_SELL_AMOUNT_KEY
            ));
        }
    }

    if let Some(target) = target {
        if target <= Decimal::ZERO {
            report
                .errors
                .push(format!("{} must be greater than 0", VOLUME_TARGET_KEY));
        }
    }

    match raw.get(ORDER_TYPE_KEY).and_then(Value::as_str).map(OrderType::from_str) {
        Some(Ok(OrderType::Market)) => {}
        Some(Ok(OrderType::Limit)) => report.warnings.push(format!(
            "{} 'limit' leaves orders resting; volume is credited before they fill",
            ORDER_TYPE_KEY
        )),
        _ => report
            .errors
            .push(format!("{} must be 'market' or 'limit'", ORDER_TYPE_KEY)),
    }

    for (key, amount) in AMOUNT_KEYS.iter().zip(&amounts) {
        if let Some(amount) = amount {
            if *amount <= Decimal::ZERO {
                report.errors.push(format!("{} must be greater than 0", key));
            }
        }
    }

    if let Some(offset) = raw.get(PRICE_OFFSET_PERCENT_KEY).filter(|v| !v.is_null()) {
        match value_to_decimal(offset) {
            Some(o) if o < Decimal::ZERO || o > MAX_PRICE_OFFSET_PERCENT => report.errors.push(
                format!(
                    "{} must be between 0 and {}",
                    PRICE_OFFSET_PERCENT_KEY, MAX_PRICE_OFFSET_PERCENT
                ),
            ),
            Some(_) => {}
            None => report
                .errors
                .push(format!("{} must be a number", PRICE_OFFSET_PERCENT_KEY)),
        }
    }

    if raw.get(ENABLED_KEY).is_none() {
        report
            .warnings
            .push(format!("{} not set, booster enabled by default", ENABLED_KEY));
    }

    report
}

/// Suggested starting settings, tuned for a few known exchanges.
pub fn recommended_config(exchange: &str) -> RawConfig {
    let mut config = RawConfig::from([
        (VOLUME_TARGET_KEY.to_string(), json!(10000)),
        (ORDER_TYPE_KEY.to_string(), json!("market")),
        (TRADE_FREQUENCY_MIN_KEY.to_string(), json!(2.0)),
        (TRADE_FREQUENCY_MAX_KEY.to_string(), json!(8.0)),
        (MIN_BUY_AMOUNT_KEY.to_string(), json!(25)),
        (MAX_BUY_AMOUNT_KEY.to_string(), json!(100)),
        (MIN_SELL_AMOUNT_KEY.to_string(), json!(25)),
        (MAX_SELL_AMOUNT_KEY.to_string(), json!(100)),
        (ENABLED_KEY.to_string(), json!(true)),
    ]);

    let adjustments: Vec<(&str, Value)> = match exchange.trim().to_lowercase().as_str() {
        "binance" => vec![
            (TRADE_FREQUENCY_MIN_KEY, json!(1.0)),
            (TRADE_FREQUENCY_MAX_KEY, json!(5.0)),
        ],
        "coinbase" => vec![
            (TRADE_FREQUENCY_MIN_KEY, json!(5.0)),
            (TRADE_FREQUENCY_MAX_KEY, json!(15.0)),
            (PRICE_OFFSET_PERCENT_KEY, json!(0.5)),
        ],
        "kraken" => vec![
            (TRADE_FREQUENCY_MIN_KEY, json!(3.0)),
            (TRADE_FREQUENCY_MAX_KEY, json!(10.0)),
            (PRICE_OFFSET_PERCENT_KEY, json!(0.3)),
        ],
        _ => Vec::new(),
    };

    for (key, value) in adjustments {
        config.insert(key.to_string(), value);
    }
    config
}

/// Rough duration of a run to the volume target.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeEstimate {
    pub estimated_trades: u64,
    pub estimated_runtime: Duration,
    /// Mean of the four amount bounds.
    pub avg_trade_amount: Decimal,
    /// Mean of the two frequency bounds.
    pub avg_frequency_seconds: f64,
}

pub fn estimate_runtime(settings: &Settings) -> RuntimeEstimate {
    let avg_trade_amount = (settings.min_buy_amount
        + settings.max_buy_amount
        + settings.min_sell_amount
        + settings.max_sell_amount)
        / Decimal::from(4);
    let avg_frequency_seconds = (settings.trade_frequency_min + settings.trade_frequency_max) / 2.0;

    let trades = if avg_trade_amount > Decimal::ZERO {
        (settings.volume_target / avg_trade_amount)
            .to_f64()
            .unwrap_or(0.0)
    } else {
        0.0
    };

    RuntimeEstimate {
        estimated_trades: trades as u64,
        estimated_runtime: Duration::try_from_secs_f64(trades * avg_frequency_seconds)
            .unwrap_or(Duration::ZERO),
        avg_trade_amount,
        avg_frequency_seconds,
    }
}
