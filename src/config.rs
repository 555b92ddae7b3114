//! Weft Configuration Module
//!
//! Engine settings that are not part of any module's declarations.
//! Config is stored in `~/.config/weft/config.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Environment variables (`WEFT_DISK_ROOT`, `WEFT_SYNC_INTERVAL_SECS`,
//!    `WEFT_DISABLED_FEATURES`)
//! 2. Config file (`~/.config/weft/config.toml`)
//! 3. Defaults

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{InjectError, Result};
use crate::scope::{DiskScope, KeyDerivation};

const DEFAULT_SYNC_INTERVAL_SECS: u64 = 30;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Disk scope location and sync cadence
    #[serde(default)]
    pub disk: DiskConfig,

    /// Feature toggles
    #[serde(default)]
    pub features: FeaturesConfig,

    /// Free-form properties readable from modules and producers
    #[serde(default)]
    pub properties: std::collections::BTreeMap<String, Value>,
}

/// Disk scope configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiskConfig {
    /// Root directory; no disk scope is configured without one
    pub root: Option<PathBuf>,

    /// Seconds between background syncs
    #[serde(default = "default_sync_interval")]
    pub sync_interval_secs: u64,

    /// Cache key derivation (type, type_and_name, target)
    #[serde(default)]
    pub key: KeyDerivation,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            root: None,
            sync_interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
            key: KeyDerivation::default(),
        }
    }
}

fn default_sync_interval() -> u64 {
    DEFAULT_SYNC_INTERVAL_SECS
}

/// Feature toggles
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeaturesConfig {
    /// Module or bundle names that are never installed
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl EngineConfig {
    /// Get the config directory path
    ///
    /// Returns `~/.config/weft/` on Unix, `%APPDATA%/weft/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("weft")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from the default location
    ///
    /// Returns default config if file doesn't exist.
    /// Returns error if file exists but is malformed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| InjectError::ConfigError {
            reason: format!("Failed to read config file {}: {}", path.display(), e),
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| InjectError::ConfigError {
            reason: format!("Failed to parse config file: {}", e),
        })
    }

    /// Merge with environment variables
    ///
    /// Environment variables take precedence over config file values.
    pub fn with_env(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`; empty values are ignored
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let lookup = |key: &str| lookup(key).filter(|value| !value.is_empty());

        if let Some(root) = lookup("WEFT_DISK_ROOT") {
            self.disk.root = Some(PathBuf::from(root));
        }

        if let Some(secs) = lookup("WEFT_SYNC_INTERVAL_SECS") {
            self.disk.sync_interval_secs =
                secs.trim().parse().map_err(|e| InjectError::ConfigError {
                    reason: format!("WEFT_SYNC_INTERVAL_SECS '{}': {}", secs, e),
                })?;
        }

        if let Some(disabled) = lookup("WEFT_DISABLED_FEATURES") {
            for name in disabled.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                if !self.features.disabled.iter().any(|d| d == name) {
                    self.features.disabled.push(name.to_string());
                }
            }
        }

        Ok(self)
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.disk.sync_interval_secs.max(1))
    }

    /// Disk scope for the configured root, without codecs
    pub fn disk_scope(&self) -> Option<DiskScope> {
        self.disk
            .root
            .as_ref()
            .map(|root| DiskScope::new(root.clone(), self.disk.key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rustc_hash::FxHashMap;
    use tempfile::TempDir;

    fn overrides(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: FxHashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_config_path_contains_weft() {
        let path = EngineConfig::config_path();
        assert!(path.to_string_lossy().contains("weft"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.disk.root.is_none());
        assert_eq!(config.disk.sync_interval_secs, 30);
        assert_eq!(config.disk.key, KeyDerivation::Type);
        assert!(config.features.disabled.is_empty());
        assert!(config.disk_scope().is_none());
    }

    #[test]
    fn test_parse_all_sections() {
        let config = EngineConfig::parse(
            r#"
            [disk]
            root = "/var/lib/app"
            sync_interval_secs = 5
            key = "type_and_name"

            [features]
            disabled = ["metrics"]

            [properties]
            "http.port" = 8080
            greeting = "hi"
            "#,
        )
        .unwrap();
        assert_eq!(config.disk.root, Some(PathBuf::from("/var/lib/app")));
        assert_eq!(config.sync_interval(), Duration::from_secs(5));
        assert_eq!(config.disk.key, KeyDerivation::TypeAndName);
        assert_eq!(config.features.disabled, vec!["metrics".to_string()]);
        assert_eq!(config.properties["http.port"], Value::from(8080));
        assert!(config.disk_scope().is_some());
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[disk\nroot = 1").unwrap();
        let err = EngineConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, InjectError::ConfigError { .. }));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let mut config = EngineConfig::default();
        config.disk.root = Some(temp_dir.path().to_path_buf());
        config.features.disabled.push("audit".into());
        fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();
        assert_eq!(EngineConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_env_overrides_config() {
        let config = EngineConfig::default()
            .with_overrides(overrides(&[
                ("WEFT_DISK_ROOT", "/tmp/weft"),
                ("WEFT_SYNC_INTERVAL_SECS", "12"),
                ("WEFT_DISABLED_FEATURES", "a, b,,a"),
            ]))
            .unwrap();
        assert_eq!(config.disk.root, Some(PathBuf::from("/tmp/weft")));
        assert_eq!(config.disk.sync_interval_secs, 12);
        assert_eq!(config.features.disabled, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_env_does_not_override_with_empty() {
        let mut config = EngineConfig::default();
        config.disk.root = Some(PathBuf::from("/from/file"));
        let config = config
            .with_overrides(overrides(&[("WEFT_DISK_ROOT", "")]))
            .unwrap();
        assert_eq!(config.disk.root, Some(PathBuf::from("/from/file")));
    }

    #[test]
    fn test_bad_interval_is_rejected() {
        let result = EngineConfig::default()
            .with_overrides(overrides(&[("WEFT_SYNC_INTERVAL_SECS", "soon")]));
        assert!(matches!(result, Err(InjectError::ConfigError { .. })));
    }
}
