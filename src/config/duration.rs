//! Custom serde module for durations written as "30s", "5m", "100ms" or plain seconds.

use serde::{self, Deserialize, Deserializer};
use std::time::Duration;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Seconds(f64),
    Text(String),
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawDuration> = Option::deserialize(deserializer)?;
    match raw {
        Some(RawDuration::Text(s)) => parse_duration(&s).map_err(serde::de::Error::custom),
        Some(RawDuration::Seconds(secs)) => seconds_to_duration(secs).map_err(serde::de::Error::custom),
        None => Ok(Duration::ZERO),
    }
}

/// Converts fractional seconds, rejecting negative and non-finite values.
pub(crate) fn seconds_to_duration(secs: f64) -> Result<Duration, String> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("invalid duration: {}", secs));
    }
    Ok(Duration::from_secs_f64(secs))
}

pub(crate) fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(Duration::ZERO);
    }

    let num_end = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());

    let (num_str, unit) = s.split_at(num_end);
    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("invalid duration number: {}", num_str))?;

    let multiplier = match unit.trim() {
        "ms" => 1e-3,
        "s" | "" => 1.0,
        "m" => 60.0,
        "h" => 3600.0,
        _ => return Err(format!("unknown duration unit: {}", unit)),
    };

    seconds_to_duration(num * multiplier)
}
