//! Settings snapshot and the cache that refreshes it.
//!
//! Raw operator input is normalised on every refresh: inverted ranges are
//! swapped, out-of-range values clamped and invalid values replaced by their
//! defaults. Corrections are logged as warnings, never raised.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::{ConfigSource, RawConfig};
use crate::domain::OrderType;

pub const VOLUME_TARGET_KEY: &str = "volume_target";
pub const ORDER_TYPE_KEY: &str = "order_type";
pub const TRADE_FREQUENCY_MIN_KEY: &str = "trade_frequency_min";
pub const TRADE_FREQUENCY_MAX_KEY: &str = "trade_frequency_max";
pub const MIN_BUY_AMOUNT_KEY: &str = "min_buy_amount";
pub const MAX_BUY_AMOUNT_KEY: &str = "max_buy_amount";
pub const MIN_SELL_AMOUNT_KEY: &str = "min_sell_amount";
pub const MAX_SELL_AMOUNT_KEY: &str = "max_sell_amount";
pub const PRICE_OFFSET_PERCENT_KEY: &str = "price_offset_percent";
pub const ENABLED_KEY: &str = "enable_volume_booster";

pub const DEFAULT_VOLUME_TARGET: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);
pub const DEFAULT_ORDER_TYPE: OrderType = OrderType::Limit;
pub const DEFAULT_TRADE_FREQUENCY_MIN: f64 = 1.0;
pub const DEFAULT_TRADE_FREQUENCY_MAX: f64 = 5.0;
pub const DEFAULT_MIN_AMOUNT: Decimal = Decimal::from_parts(10, 0, 0, false, 0);
pub const DEFAULT_MAX_AMOUNT: Decimal = Decimal::from_parts(100, 0, 0, false, 0);
pub const DEFAULT_PRICE_OFFSET_PERCENT: Decimal = Decimal::from_parts(1, 0, 0, false, 1);
pub const DEFAULT_ENABLED: bool = true;

pub const MIN_TRADE_FREQUENCY: f64 = 0.1;
pub const MAX_TRADE_FREQUENCY: f64 = 3600.0;
pub const MAX_PRICE_OFFSET_PERCENT: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

/// Default refresh interval of the cache.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Immutable, normalised booster settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Cumulative notional to generate before stopping.
    pub volume_target: Decimal,
    pub order_type: OrderType,
    /// Seconds between trades, lower bound.
    pub trade_frequency_min: f64,
    /// Seconds between trades, upper bound.
    pub trade_frequency_max: f64,
    /// Buy size range in quote currency.
    pub min_buy_amount: Decimal,
    pub max_buy_amount: Decimal,
    /// Sell size range in quote currency.
    pub min_sell_amount: Decimal,
    pub max_sell_amount: Decimal,
    /// Limit price offset from market, in percent.
    pub price_offset_percent: Decimal,
    pub enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            volume_target: DEFAULT_VOLUME_TARGET,
            order_type: DEFAULT_ORDER_TYPE,
            trade_frequency_min: DEFAULT_TRADE_FREQUENCY_MIN,
            trade_frequency_max: DEFAULT_TRADE_FREQUENCY_MAX,
            min_buy_amount: DEFAULT_MIN_AMOUNT,
            max_buy_amount: DEFAULT_MAX_AMOUNT,
            min_sell_amount: DEFAULT_MIN_AMOUNT,
            max_sell_amount: DEFAULT_MAX_AMOUNT,
            price_offset_percent: DEFAULT_PRICE_OFFSET_PERCENT,
            enabled: DEFAULT_ENABLED,
        }
    }
}

/// Result of normalising raw settings.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub settings: Settings,
    /// Human-readable description of every correction applied.
    pub corrections: Vec<String>,
}

impl Settings {
    /// Builds settings from raw input, correcting what can be corrected.
    pub fn normalize(raw: &RawConfig) -> Normalized {
        let mut corrections = Vec::new();
        let defaults = Settings::default();

        let volume_target = match raw.get(VOLUME_TARGET_KEY).filter(|v| !v.is_null()) {
            None => defaults.volume_target,
            Some(v) => match value_to_decimal(v) {
                Some(t) if t > Decimal::ZERO => t,
                _ => {
                    corrections.push(format!(
                        "{} must be greater than 0 (got {}), using {}",
                        VOLUME_TARGET_KEY, v, defaults.volume_target
                    ));
                    defaults.volume_target
                }
            },
        };

        let order_type = match raw.get(ORDER_TYPE_KEY).filter(|v| !v.is_null()) {
            None => defaults.order_type,
            Some(v) => match v.as_str().map(OrderType::from_str) {
                Some(Ok(t)) => t,
                _ => {
                    corrections.push(format!(
                        "{} must be 'market' or 'limit' (got {}), using {}",
                        ORDER_TYPE_KEY, v, defaults.order_type
                    ));
                    defaults.order_type
                }
            },
        };

        let freq_min = frequency(raw, TRADE_FREQUENCY_MIN_KEY, defaults.trade_frequency_min, &mut corrections);
        let freq_max = frequency(raw, TRADE_FREQUENCY_MAX_KEY, defaults.trade_frequency_max, &mut corrections);
        let (trade_frequency_min, trade_frequency_max) = ordered(
            freq_min,
            freq_max,
            TRADE_FREQUENCY_MIN_KEY,
            TRADE_FREQUENCY_MAX_KEY,
            &mut corrections,
        );

        let min_buy = amount(raw, MIN_BUY_AMOUNT_KEY, DEFAULT_MIN_AMOUNT, &mut corrections);
        let max_buy = amount(raw, MAX_BUY_AMOUNT_KEY, DEFAULT_MAX_AMOUNT, &mut corrections);
        let (min_buy_amount, max_buy_amount) =
            ordered(min_buy, max_buy, MIN_BUY_AMOUNT_KEY, MAX_BUY_AMOUNT_KEY, &mut corrections);

        let min_sell = amount(raw, MIN_SELL_AMOUNT_KEY, DEFAULT_MIN_AMOUNT, &mut corrections);
        let max_sell = amount(raw, MAX_SELL_AMOUNT_KEY, DEFAULT_MAX_AMOUNT, &mut corrections);
        let (min_sell_amount, max_sell_amount) =
            ordered(min_sell, max_sell, MIN_SELL_AMOUNT_KEY, MAX_SELL_AMOUNT_KEY, &mut corrections);

        let price_offset_percent = match raw.get(PRICE_OFFSET_PERCENT_KEY).filter(|v| !v.is_null()) {
            None => defaults.price_offset_percent,
            Some(v) => match value_to_decimal(v) {
                Some(p) if p < Decimal::ZERO => {
                    corrections.push(format!("{} below 0, clamped to 0", PRICE_OFFSET_PERCENT_KEY));
                    Decimal::ZERO
                }
                Some(p) if p > MAX_PRICE_OFFSET_PERCENT => {
                    corrections.push(format!(
                        "{} above {}, clamped",
                        PRICE_OFFSET_PERCENT_KEY, MAX_PRICE_OFFSET_PERCENT
                    ));
                    MAX_PRICE_OFFSET_PERCENT
                }
                Some(p) => p,
                None => {
                    corrections.push(format!(
                        "{} is not a number (got {}), using {}",
                        PRICE_OFFSET_PERCENT_KEY, v, defaults.price_offset_percent
                    ));
                    defaults.price_offset_percent
                }
            },
        };

        let enabled = match raw.get(ENABLED_KEY).filter(|v| !v.is_null()) {
            None => defaults.enabled,
            Some(v) => match value_to_bool(v) {
                Some(b) => b,
                None => {
                    corrections.push(format!(
                        "{} is not a boolean (got {}), using {}",
                        ENABLED_KEY, v, defaults.enabled
                    ));
                    defaults.enabled
                }
            },
        };

        Normalized {
            settings: Settings {
                volume_target,
                order_type,
                trade_frequency_min,
                trade_frequency_max,
                min_buy_amount,
                max_buy_amount,
                min_sell_amount,
                max_sell_amount,
                price_offset_percent,
                enabled,
            },
            corrections,
        }
    }

    /// Writes the settings back as a raw mapping.
    pub fn to_raw(&self) -> RawConfig {
        RawConfig::from([
            (VOLUME_TARGET_KEY.to_string(), decimal_to_value(self.volume_target)),
            (ORDER_TYPE_KEY.to_string(), json!(self.order_type.to_string())),
            (TRADE_FREQUENCY_MIN_KEY.to_string(), json!(self.trade_frequency_min)),
            (TRADE_FREQUENCY_MAX_KEY.to_string(), json!(self.trade_frequency_max)),
            (MIN_BUY_AMOUNT_KEY.to_string(), decimal_to_value(self.min_buy_amount)),
            (MAX_BUY_AMOUNT_KEY.to_string(), decimal_to_value(self.max_buy_amount)),
            (MIN_SELL_AMOUNT_KEY.to_string(), decimal_to_value(self.min_sell_amount)),
            (MAX_SELL_AMOUNT_KEY.to_string(), decimal_to_value(self.max_sell_amount)),
            (
                PRICE_OFFSET_PERCENT_KEY.to_string(),
                decimal_to_value(self.price_offset_percent),
            ),
            (ENABLED_KEY.to_string(), json!(self.enabled)),
        ])
    }
}

fn frequency(raw: &RawConfig, key: &str, default: f64, corrections: &mut Vec<String>) -> f64 {
    let Some(v) = raw.get(key).filter(|v| !v.is_null()) else {
        return default;
    };
    match value_to_f64(v) {
        Some(f) if f < MIN_TRADE_FREQUENCY => {
            corrections.push(format!("{} below {}s, clamped", key, MIN_TRADE_FREQUENCY));
            MIN_TRADE_FREQUENCY
        }
        Some(f) if f > MAX_TRADE_FREQUENCY => {
            corrections.push(format!("{} above {}s, clamped", key, MAX_TRADE_FREQUENCY));
            MAX_TRADE_FREQUENCY
        }
        Some(f) => f,
        None => {
            corrections.push(format!("{} is not a number (got {}), using {}", key, v, default));
            default
        }
    }
}

fn amount(raw: &RawConfig, key: &str, default: Decimal, corrections: &mut Vec<String>) -> Decimal {
    let Some(v) = raw.get(key).filter(|v| !v.is_null()) else {
        return default;
    };
    match value_to_decimal(v) {
        Some(a) if a > Decimal::ZERO => a,
        _ => {
            corrections.push(format!(
                "{} must be greater than 0 (got {}), using {}",
                key, v, default
            ));
            default
        }
    }
}

fn ordered<T: PartialOrd>(
    min: T,
    max: T,
    min_key: &str,
    max_key: &str,
    corrections: &mut Vec<String>,
) -> (T, T) {
    if min > max {
        corrections.push(format!(
            "{} is greater than {}, values swapped",
            min_key, max_key
        ));
        (max, min)
    } else {
        (min, max)
    }
}

pub(crate) fn value_to_f64(v: &Value) -> Option<f64> {
    let f = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    f.is_finite().then_some(f)
}

pub(crate) fn value_to_decimal(v: &Value) -> Option<Decimal> {
    let text = match v {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
        .or_else(|| value_to_f64(v).and_then(Decimal::from_f64))
}

fn value_to_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        _ => None,
    }
}

fn decimal_to_value(d: Decimal) -> Value {
    d.to_f64().map(|f| json!(f)).unwrap_or(Value::Null)
}

/// Whether the operator's value already equals its normalised form.
fn same_setting(original: &Value, normalized: &Value) -> bool {
    match (original, normalized) {
        (Value::Number(_), Value::Number(_)) => {
            value_to_decimal(original) == value_to_decimal(normalized)
        }
        _ => original == normalized,
    }
}

/// Read-many, write-rarely snapshot of the booster settings.
pub struct ConfigCache {
    source: Arc<dyn ConfigSource>,
    values: RawConfig,
    settings: Settings,
    refreshed_at: Option<Instant>,
    refresh_interval: Duration,
}

impl ConfigCache {
    /// Creates an empty cache. Call [`ConfigCache::refresh`] before use.
    pub fn new(source: Arc<dyn ConfigSource>, refresh_interval: Duration) -> Self {
        let refresh_interval = if refresh_interval.is_zero() {
            DEFAULT_REFRESH_INTERVAL
        } else {
            refresh_interval
        };

        Self {
            source,
            values: RawConfig::new(),
            settings: Settings::default(),
            refreshed_at: None,
            refresh_interval,
        }
    }

    /// Reloads the raw settings and replaces the whole snapshot.
    pub fn refresh(&mut self) -> &Settings {
        let raw = self.source.load();
        let Normalized {
            settings,
            corrections,
        } = Settings::normalize(&raw);

        for correction in &corrections {
            warn!(correction = %correction, "Booster setting corrected");
        }

        // Unknown keys survive so `get` can still serve them.
        let mut values = raw;
        for (key, normalized) in settings.to_raw() {
            let as_written = values
                .get(&key)
                .is_some_and(|original| same_setting(original, &normalized));
            if !as_written {
                values.insert(key, normalized);
            }
        }

        self.values = values;
        self.settings = settings;
        self.refreshed_at = Some(Instant::now());

        debug!(settings = ?self.settings, "Booster settings refreshed");
        &self.settings
    }

    /// True when never refreshed or older than the refresh interval.
    pub fn is_stale(&self) -> bool {
        self.refreshed_at
            .map(|at| at.elapsed() > self.refresh_interval)
            .unwrap_or(true)
    }

    /// Refreshes only when stale. Returns whether a refresh happened.
    pub fn refresh_if_stale(&mut self) -> bool {
        if self.is_stale() {
            self.refresh();
            true
        } else {
            false
        }
    }

    /// Current typed snapshot.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Cached value for `key`, or `default` when absent, null or of the wrong type.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.values.get(key) {
            None | Some(Value::Null) => default,
            Some(v) => serde_json::from_value(v.clone()).unwrap_or(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SharedConfigSource;

    fn raw(pairs: &[(&str, Value)]) -> RawConfig {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_defaults_when_empty() {
        let n = Settings::normalize(&RawConfig::new());
        assert_eq!(n.settings, Settings::default());
        assert!(n.corrections.is_empty());
    }

    #[test]
    fn test_inverted_frequencies_are_swapped() {
        let n = Settings::normalize(&raw(&[
            (TRADE_FREQUENCY_MIN_KEY, json!(5.0)),
            (TRADE_FREQUENCY_MAX_KEY, json!(1.0)),
        ]));
        assert_eq!(n.settings.trade_frequency_min, 1.0);
        assert_eq!(n.settings.trade_frequency_max, 5.0);
        assert_eq!(n.corrections.len(), 1);
    }

    #[test]
    fn test_frequencies_are_clamped() {
        let n = Settings::normalize(&raw(&[
            (TRADE_FREQUENCY_MIN_KEY, json!(0.01)),
            (TRADE_FREQUENCY_MAX_KEY, json!(10_000)),
        ]));
        assert_eq!(n.settings.trade_frequency_min, MIN_TRADE_FREQUENCY);
        assert_eq!(n.settings.trade_frequency_max, MAX_TRADE_FREQUENCY);
    }

    #[test]
    fn test_inverted_amounts_are_swapped() {
        let n = Settings::normalize(&raw(&[
            (MIN_BUY_AMOUNT_KEY, json!(50)),
            (MAX_BUY_AMOUNT_KEY, json!(10)),
            (MIN_SELL_AMOUNT_KEY, json!("40")),
            (MAX_SELL_AMOUNT_KEY, json!("20")),
        ]));
        assert_eq!(n.settings.min_buy_amount, Decimal::from(10));
        assert_eq!(n.settings.max_buy_amount, Decimal::from(50));
        assert_eq!(n.settings.min_sell_amount, Decimal::from(20));
        assert_eq!(n.settings.max_sell_amount, Decimal::from(40));
    }

    #[test]
    fn test_non_positive_target_falls_back_to_default() {
        for bad in [json!(0), json!(-5), json!("abc")] {
            let n = Settings::normalize(&raw(&[(VOLUME_TARGET_KEY, bad)]));
            assert_eq!(n.settings.volume_target, DEFAULT_VOLUME_TARGET);
            assert_eq!(n.corrections.len(), 1);
        }
    }

    #[test]
    fn test_non_positive_amount_falls_back_to_default() {
        let n = Settings::normalize(&raw(&[(MIN_SELL_AMOUNT_KEY, json!(0))]));
        assert_eq!(n.settings.min_sell_amount, DEFAULT_MIN_AMOUNT);
    }

    #[test]
    fn test_price_offset_is_clamped() {
        let n = Settings::normalize(&raw(&[(PRICE_OFFSET_PERCENT_KEY, json!(25))]));
        assert_eq!(n.settings.price_offset_percent, MAX_PRICE_OFFSET_PERCENT);
        let n = Settings::normalize(&raw(&[(PRICE_OFFSET_PERCENT_KEY, json!(-1))]));
        assert_eq!(n.settings.price_offset_percent, Decimal::ZERO);
    }

    #[test]
    fn test_unknown_order_type_falls_back() {
        let n = Settings::normalize(&raw(&[(ORDER_TYPE_KEY, json!("stop"))]));
        assert_eq!(n.settings.order_type, DEFAULT_ORDER_TYPE);
        let n = Settings::normalize(&raw(&[(ORDER_TYPE_KEY, json!("MARKET"))]));
        assert_eq!(n.settings.order_type, OrderType::Market);
    }

    #[test]
    fn test_enabled_accepts_strings() {
        let n = Settings::normalize(&raw(&[(ENABLED_KEY, json!("false"))]));
        assert!(!n.settings.enabled);
    }

    #[test]
    fn test_null_values_use_defaults_silently() {
        let n = Settings::normalize(&raw(&[(VOLUME_TARGET_KEY, Value::Null)]));
        assert_eq!(n.settings.volume_target, DEFAULT_VOLUME_TARGET);
        assert!(n.corrections.is_empty());
    }

    #[test]
    fn test_cache_refresh_and_get() {
        let source = Arc::new(SharedConfigSource::new(raw(&[
            (VOLUME_TARGET_KEY, json!(1000.0)),
            (ORDER_TYPE_KEY, json!("market")),
            (TRADE_FREQUENCY_MIN_KEY, json!(0.1)),
            (TRADE_FREQUENCY_MAX_KEY, json!(0.5)),
            ("custom_key", json!("kept")),
        ])));
        let mut cache = ConfigCache::new(source, Duration::ZERO);

        assert!(cache.is_stale());
        cache.refresh();
        assert!(!cache.is_stale());

        assert_eq!(cache.get(VOLUME_TARGET_KEY, 0.0), 1000.0);
        assert_eq!(cache.get(ORDER_TYPE_KEY, String::new()), "market");
        assert_eq!(cache.get(TRADE_FREQUENCY_MIN_KEY, 0.0), 0.1);
        assert_eq!(cache.get(PRICE_OFFSET_PERCENT_KEY, 0.0), 0.1);
        assert_eq!(cache.get("custom_key", String::new()), "kept");
        assert!(cache.get(ENABLED_KEY, false));
    }

    #[test]
    fn test_cache_get_substitutes_default_for_missing_and_null() {
        let source = Arc::new(SharedConfigSource::new(raw(&[("nothing", Value::Null)])));
        let mut cache = ConfigCache::new(source, Duration::ZERO);
        cache.refresh();

        assert_eq!(cache.get("nothing", 7u32), 7);
        assert_eq!(cache.get("missing", "x".to_string()), "x");
        // Wrong type also falls back.
        assert_eq!(cache.get(ORDER_TYPE_KEY, 3u32), 3);
    }

    #[test]
    fn test_cache_refresh_is_full_replace() {
        let source = Arc::new(SharedConfigSource::new(raw(&[
            (TRADE_FREQUENCY_MIN_KEY, json!(0.1)),
            ("extra", json!(1)),
        ])));
        let mut cache = ConfigCache::new(source.clone(), Duration::ZERO);
        cache.refresh();
        assert_eq!(cache.get("extra", 0), 1);

        source.remove("extra");
        source.set(TRADE_FREQUENCY_MIN_KEY, json!(1.0));
        source.set(TRADE_FREQUENCY_MAX_KEY, json!(2.0));
        cache.refresh();

        assert_eq!(cache.get("extra", 0), 0);
        assert_eq!(cache.settings().trade_frequency_min, 1.0);
        assert_eq!(cache.settings().trade_frequency_max, 2.0);
    }

    #[test]
    fn test_cache_serves_values_as_written() {
        let source = Arc::new(SharedConfigSource::new(raw(&[
            (VOLUME_TARGET_KEY, json!(5000)),
            (MIN_BUY_AMOUNT_KEY, json!(25)),
            (TRADE_FREQUENCY_MAX_KEY, json!(10_000)),
        ])));
        let mut cache = ConfigCache::new(source, Duration::ZERO);
        cache.refresh();

        assert_eq!(cache.get(VOLUME_TARGET_KEY, 0u64), 5000);
        assert_eq!(cache.get(MIN_BUY_AMOUNT_KEY, 0u32), 25);
        // Clamped values are served in their corrected form.
        assert_eq!(cache.get(TRADE_FREQUENCY_MAX_KEY, 0.0), 3600.0);
    }

    #[test]
    fn test_refresh_if_stale() {
        let source = Arc::new(SharedConfigSource::default());
        let mut cache = ConfigCache::new(source, Duration::from_secs(3600));
        assert!(cache.refresh_if_stale());
        assert!(!cache.refresh_if_stale());
    }
}
