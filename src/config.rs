// Registry Configuration
// Pool defaults, dialect detection deadline and log filter, loaded from JSON

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to get config directory")]
    ConfigDir,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Sizing applied to pools built by this crate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PoolSettings {
    pub max_size: u32,
    pub min_idle: Option<u32>,
    pub connection_timeout_ms: u64,
}

impl PoolSettings {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_size: 10,
            min_idle: Some(1),
            connection_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    pub pool: PoolSettings,
    /// Deadline for dialect detection; zero disables it
    pub dialect_timeout_ms: u64,
    pub log_filter: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            pool: PoolSettings::default(),
            dialect_timeout_ms: 5_000,
            log_filter: "info".to_string(),
        }
    }
}

impl RegistryConfig {
    pub fn dialect_timeout(&self) -> Option<Duration> {
        (self.dialect_timeout_ms > 0).then(|| Duration::from_millis(self.dialect_timeout_ms))
    }

    /// Load a config file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Load a config file, falling back to defaults when it does not exist
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Write the config as pretty JSON, creating the parent directory
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Default config location in the platform config directory
pub fn default_config_path() -> ConfigResult<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "live-registry", "live-registry")
        .ok_or(ConfigError::ConfigDir)?;

    Ok(proj_dirs.config_dir().join("registry.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

    fn temp_path(name: &str) -> PathBuf {
        let counter = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!(
            "live_registry_config_{}_{}_{}.json",
            std::process::id(),
            counter,
            name
        ))
    }

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::default();
        assert_eq!(config.pool.max_size, 10);
        assert_eq!(config.pool.min_idle, Some(1));
        assert_eq!(config.dialect_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: RegistryConfig =
            serde_json::from_str(r#"{"pool": {"max_size": 3}, "dialect_timeout_ms": 0}"#).unwrap();

        assert_eq!(config.pool.max_size, 3);
        assert_eq!(config.pool.connection_timeout_ms, 30_000);
        assert_eq!(config.dialect_timeout(), None);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("roundtrip");
        let mut config = RegistryConfig::default();
        config.log_filter = "debug,live_registry=trace".to_string();

        config.save(&path).unwrap();
        let loaded = RegistryConfig::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = temp_path("missing");
        assert_eq!(RegistryConfig::load_or_default(&path).unwrap(), RegistryConfig::default());
        assert!(matches!(RegistryConfig::load(&path), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_default_config_path_file_name() {
        // No home directory in some CI sandboxes
        if let Ok(path) = default_config_path() {
            assert!(path.ends_with("registry.json"));
        }
    }

    #[test]
    fn test_invalid_json_is_error() {
        let path = temp_path("invalid");
        std::fs::write(&path, "{ not json").unwrap();
        let result = RegistryConfig::load_or_default(&path);
        let _ = std::fs::remove_file(&path);

        assert!(matches!(result, Err(ConfigError::Json(_))));
    }
}
