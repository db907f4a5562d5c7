//! Configuration loading and validation for the volume booster.
//!
//! Uses serde_yaml to load YAML configuration files. The `booster` section
//! is kept untyped so the engine's settings cache can normalise whatever
//! the operator wrote; environment variables `BOOSTER_<KEY>` override it.

mod app;
mod duration;
mod engine;
mod error;
mod paper;
mod source;

pub use app::AppConfig;
pub use engine::{EngineConfig, RetryConfig};
pub use error::ConfigError;
pub use paper::PaperConfig;
pub use source::{ConfigSource, RawConfig, SharedConfigSource};

use serde::Deserialize;
use serde_json::Value;
use std::{env, fs};

use crate::domain::split_symbol;

/// Prefix of environment variables that override booster settings.
const ENV_OVERRIDE_PREFIX: &str = "BOOSTER_";

/// Root configuration structure for the volume booster.
///
/// Required sections: app, symbols.
/// Optional sections: booster, engine, paper.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Application-level settings like name and environment.
    pub app: AppConfig,
    /// Symbols to boost, in processing order (e.g., "BTC/USDT").
    pub symbols: Vec<String>,
    /// Raw booster settings (volume target, amounts, frequencies...).
    #[serde(default)]
    pub booster: RawConfig,
    /// Loop timeouts and start-up retry (optional).
    #[serde(default)]
    pub engine: EngineConfig,
    /// Simulated trading facade (optional).
    pub paper: Option<PaperConfig>,
}

impl Config {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Loads `.env` first (if present) so `BOOSTER_*` overrides can live there.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let content = fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&content)?;

        config.apply_env_overrides(env::vars());
        config.validate()?;

        Ok(config)
    }

    /// Applies `BOOSTER_<KEY>=<value>` pairs onto the booster section.
    ///
    /// Values are parsed as JSON (numbers, booleans) and otherwise kept as strings.
    fn apply_env_overrides<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, raw) in vars {
            let Some(key) = name.strip_prefix(ENV_OVERRIDE_PREFIX) else {
                continue;
            };
            if key.is_empty() {
                continue;
            }
            let value = serde_json::from_str::<Value>(&raw).unwrap_or(Value::String(raw));
            self.booster.insert(key.to_lowercase(), value);
        }
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.app.name.is_empty() {
            return Err(ConfigError::Validation("app.name is required".into()));
        }

        if self.symbols.is_empty() {
            return Err(ConfigError::Validation(
                "at least one symbol is required".into(),
            ));
        }

        for symbol in &self.symbols {
            if split_symbol(symbol).is_none() {
                return Err(ConfigError::Validation(format!(
                    "symbol {}: expected BASE/QUOTE format",
                    symbol
                )));
            }
        }

        if let Some(ref retry) = self.engine.retry {
            if let Some(multiplier) = retry.multiplier {
                if multiplier < 1.0 {
                    return Err(ConfigError::Validation(
                        "engine.retry.multiplier must be at least 1".into(),
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
