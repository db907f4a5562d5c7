//! Raw booster settings as typed by the operator.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// Untyped key -> value mapping of booster settings.
pub type RawConfig = HashMap<String, Value>;

/// ConfigSource is read by the settings cache on every refresh.
pub trait ConfigSource: Send + Sync {
    /// Returns a copy of the current raw settings.
    fn load(&self) -> RawConfig;
}

/// Lock-guarded raw settings that a host can change at runtime.
#[derive(Debug, Default)]
pub struct SharedConfigSource {
    values: RwLock<RawConfig>,
}

impl SharedConfigSource {
    pub fn new(values: RawConfig) -> Self {
        Self {
            values: RwLock::new(values),
        }
    }

    /// Sets a single key. The engine sees it on its next refresh.
    pub fn set(&self, key: &str, value: Value) {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value);
    }

    /// Removes a key so the engine falls back to its default.
    pub fn remove(&self, key: &str) {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.remove(key);
    }
}

impl ConfigSource for SharedConfigSource {
    fn load(&self) -> RawConfig {
        self.values.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_remove() {
        let source = SharedConfigSource::new(RawConfig::from([(
            "volume_target".to_string(),
            json!(1000.0),
        )]));

        source.set("order_type", json!("market"));
        let raw = source.load();
        assert_eq!(raw.get("volume_target"), Some(&json!(1000.0)));
        assert_eq!(raw.get("order_type"), Some(&json!("market")));

        source.remove("order_type");
        assert!(!source.load().contains_key("order_type"));
    }
}
