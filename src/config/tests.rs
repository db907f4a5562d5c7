//! Tests for config module.

use super::*;
use serde_json::json;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

// ==================== Duration parsing tests ====================

#[test]
fn test_parse_duration_seconds() {
    let d = duration::parse_duration("30s").unwrap();
    assert_eq!(d, Duration::from_secs(30));
}

#[test]
fn test_parse_duration_minutes() {
    let d = duration::parse_duration("5m").unwrap();
    assert_eq!(d, Duration::from_secs(300));
}

#[test]
fn test_parse_duration_milliseconds() {
    let d = duration::parse_duration("100ms").unwrap();
    assert_eq!(d, Duration::from_millis(100));
}

#[test]
fn test_parse_duration_bare_number_is_seconds() {
    let d = duration::parse_duration("2").unwrap();
    assert_eq!(d, Duration::from_secs(2));
}

#[test]
fn test_parse_duration_empty() {
    let d = duration::parse_duration("").unwrap();
    assert_eq!(d, Duration::ZERO);
}

#[test]
fn test_parse_duration_invalid_unit() {
    let result = duration::parse_duration("10x");
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("unknown duration unit"));
}

#[test]
fn test_seconds_to_duration_rejects_negative() {
    assert!(duration::seconds_to_duration(-1.0).is_err());
    assert!(duration::seconds_to_duration(f64::NAN).is_err());
    assert_eq!(
        duration::seconds_to_duration(0.5).unwrap(),
        Duration::from_millis(500)
    );
}

// ==================== YAML field loading tests ====================

/// Parse config from YAML string (for testing).
fn from_yaml(yaml: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_yaml::from_str(yaml)?;
    Ok(config)
}

fn minimal_valid_yaml() -> String {
    r#"
app:
  name: testbooster

symbols:
  - BTC/USDT
"#
    .to_string()
}

#[test]
fn test_load_app_fields() {
    let yaml = r#"
app:
  name: mybooster
  env: production
  log_level: debug

symbols:
  - ETH/USDT
"#;
    let cfg = from_yaml(yaml).unwrap();

    assert_eq!(cfg.app.name, "mybooster");
    assert_eq!(cfg.app.env, "production");
    assert_eq!(cfg.app.log_level, Some("debug".to_string()));
}

#[test]
fn test_app_env_defaults_to_development() {
    let cfg = from_yaml(&minimal_valid_yaml()).unwrap();
    assert_eq!(cfg.app.env, "development");
    assert!(cfg.booster.is_empty());
    assert!(cfg.paper.is_none());
}

#[test]
fn test_load_booster_section_keeps_raw_values() {
    let yaml = r#"
app:
  name: test

symbols:
  - BTC/USDT

booster:
  volume_target: 1000
  order_type: market
  trade_frequency_min: 0.1
  trade_frequency_max: "0.5"
  enable_volume_booster: true
"#;
    let cfg = from_yaml(yaml).unwrap();

    assert_eq!(cfg.booster.get("volume_target"), Some(&json!(1000)));
    assert_eq!(cfg.booster.get("order_type"), Some(&json!("market")));
    assert_eq!(cfg.booster.get("trade_frequency_min"), Some(&json!(0.1)));
    assert_eq!(cfg.booster.get("trade_frequency_max"), Some(&json!("0.5")));
    assert_eq!(cfg.booster.get("enable_volume_booster"), Some(&json!(true)));
}

#[test]
fn test_load_engine_fields() {
    let yaml = r#"
app:
  name: test

symbols:
  - BTC/USDT

engine:
  config_refresh_interval: 1m
  market_data_timeout: 5s
  order_timeout: 2.5
  shutdown_timeout: 500ms
  retry:
    max_attempts: 3
    initial_delay: 100ms
    max_delay: 1s
    multiplier: 2.0
"#;
    let cfg = from_yaml(yaml).unwrap();

    assert_eq!(cfg.engine.config_refresh_interval, Duration::from_secs(60));
    assert_eq!(cfg.engine.market_data_timeout, Duration::from_secs(5));
    assert_eq!(cfg.engine.order_timeout, Duration::from_millis(2500));
    assert_eq!(cfg.engine.shutdown_timeout, Duration::from_millis(500));

    let retry = cfg.engine.retry.unwrap();
    assert_eq!(retry.max_attempts, Some(3));
    assert_eq!(retry.initial_delay, Duration::from_millis(100));
    assert_eq!(retry.max_delay, Duration::from_secs(1));
    assert_eq!(retry.multiplier, Some(2.0));
}

#[test]
fn test_engine_defaults_to_zero_durations() {
    let cfg = from_yaml(&minimal_valid_yaml()).unwrap();
    assert_eq!(cfg.engine.config_refresh_interval, Duration::ZERO);
    assert_eq!(cfg.engine.market_data_timeout, Duration::ZERO);
    assert!(cfg.engine.retry.is_none());
}

#[test]
fn test_load_paper_fields() {
    let yaml = r#"
app:
  name: test

symbols:
  - BTC/USDT

paper:
  fee_rate: "0.001"
  balances:
    USDT: "1000"
    BTC: 10
  markets:
    BTC/USDT:
      price: "1000"
      min_quantity: "0.00001"
      min_cost: 5
      amount_precision: 5
"#;
    let cfg = from_yaml(yaml).unwrap();

    let paper = cfg.paper.unwrap();
    assert!(paper.enabled);
    assert_eq!(paper.fee_rate, Some(rust_decimal::Decimal::new(1, 3)));
    assert_eq!(
        paper.balances.get("USDT"),
        Some(&rust_decimal::Decimal::from(1000))
    );
    assert_eq!(paper.balances.get("BTC"), Some(&rust_decimal::Decimal::from(10)));

    let market = paper.markets.get("BTC/USDT").unwrap();
    assert_eq!(market.price, rust_decimal::Decimal::from(1000));
    assert_eq!(market.min_quantity, Some(rust_decimal::Decimal::new(1, 5)));
    assert_eq!(market.min_cost, Some(rust_decimal::Decimal::from(5)));
    assert_eq!(market.amount_precision, Some(5));
}

// ==================== Env override tests ====================

#[test]
fn test_env_overrides_parse_json_then_string() {
    let mut cfg = from_yaml(&minimal_valid_yaml()).unwrap();

    cfg.apply_env_overrides(vec![
        ("BOOSTER_VOLUME_TARGET".to_string(), "2500".to_string()),
        ("BOOSTER_ORDER_TYPE".to_string(), "limit".to_string()),
        ("BOOSTER_ENABLE_VOLUME_BOOSTER".to_string(), "false".to_string()),
        ("UNRELATED".to_string(), "1".to_string()),
        ("BOOSTER_".to_string(), "ignored".to_string()),
    ]);

    assert_eq!(cfg.booster.get("volume_target"), Some(&json!(2500)));
    assert_eq!(cfg.booster.get("order_type"), Some(&json!("limit")));
    assert_eq!(cfg.booster.get("enable_volume_booster"), Some(&json!(false)));
    assert_eq!(cfg.booster.len(), 3);
}

// ==================== Validation tests ====================

#[test]
fn test_validate_minimal_config() {
    let cfg = from_yaml(&minimal_valid_yaml()).unwrap();
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_validate_empty_app_name() {
    let yaml = r#"
app:
  name: ""

symbols:
  - BTC/USDT
"#;
    let cfg = from_yaml(yaml).unwrap();
    let result = cfg.validate();
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("app.name is required"));
}

#[test]
fn test_validate_no_symbols() {
    let yaml = r#"
app:
  name: test

symbols: []
"#;
    let cfg = from_yaml(yaml).unwrap();
    let result = cfg.validate();
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("at least one symbol is required"));
}

#[test]
fn test_validate_malformed_symbol() {
    let yaml = r#"
app:
  name: test

symbols:
  - BTCUSDT
"#;
    let cfg = from_yaml(yaml).unwrap();
    let result = cfg.validate();
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("BASE/QUOTE"));
}

#[test]
fn test_validate_retry_multiplier_below_one() {
    let yaml = r#"
app:
  name: test

symbols:
  - BTC/USDT

engine:
  retry:
    multiplier: 0.5
"#;
    let cfg = from_yaml(yaml).unwrap();
    let result = cfg.validate();
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("multiplier"));
}

// ==================== File loading tests ====================

#[test]
fn test_load_from_file() {
    let yaml = r#"
app:
  name: filebooster

symbols:
  - BTC/USDT
  - ETH/USDT

booster:
  volume_target: 500
"#;

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    let cfg = Config::load(file.path().to_str().unwrap()).unwrap();

    assert_eq!(cfg.app.name, "filebooster");
    assert_eq!(cfg.symbols, vec!["BTC/USDT", "ETH/USDT"]);
    assert!(cfg.booster.contains_key("volume_target"));
}

#[test]
fn test_load_file_not_found() {
    let result = Config::load("nonexistent_config.yaml");
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("failed to read config file"));
}

#[test]
fn test_load_file_invalid_yaml() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"app: [unterminated").unwrap();

    let result = Config::load(file.path().to_str().unwrap());
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}
