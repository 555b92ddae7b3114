//! Environment - properties and feature toggles threaded through assembly
//!
//! Passed to every module's `declare` and readable from producers through
//! `Context::env()`.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::EngineConfig;
use crate::error::{InjectError, Result};

#[derive(Debug, Clone, Default)]
pub struct Environment {
    properties: FxHashMap<String, Value>,
    disabled: FxHashSet<String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            properties: config
                .properties
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            disabled: config.features.disabled.iter().cloned().collect(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Toggle a module or bundle off by name
    pub fn disable(mut self, name: impl Into<String>) -> Self {
        self.disabled.insert(name.into());
        self
    }

    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.contains(name)
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Typed property; `None` when absent, error when it has the wrong shape
    pub fn property<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(value) = self.properties.get(key) else {
            return Ok(None);
        };
        T::deserialize(value)
            .map(Some)
            .map_err(|e| InjectError::ConfigError {
                reason: format!("property '{}': {}", key, e),
            })
    }

    /// Typed property with a fallback for absent keys
    pub fn property_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T> {
        Ok(self.property(key)?.unwrap_or(default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_properties() {
        let env = Environment::new()
            .with_property("port", 8080)
            .with_property("host", "localhost");
        assert_eq!(env.property::<u16>("port").unwrap(), Some(8080));
        assert_eq!(env.property::<String>("host").unwrap().as_deref(), Some("localhost"));
        assert_eq!(env.property::<u16>("missing").unwrap(), None);
        assert_eq!(env.property_or("missing", 3u8).unwrap(), 3);
        assert!(env.property::<u16>("host").is_err());
    }

    #[test]
    fn built_from_config() {
        let mut config = EngineConfig::default();
        config.features.disabled.push("audit".into());
        config.properties.insert("answer".into(), Value::from(42));
        let env = Environment::from_config(&config);
        assert!(env.is_disabled("audit"));
        assert!(!env.is_disabled("core"));
        assert_eq!(env.property::<i32>("answer").unwrap(), Some(42));
    }
}
