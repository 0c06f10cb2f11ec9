//! Configuration file handling.
//!
//! The file is TOML with three optional sections:
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:1337"
//! timeout_secs = 10
//!
//! [storage]
//! path = "/home/me/.local/share/restaurant-reviews/cache.db"
//!
//! [sync]
//! retention = 30
//! replay_policy = "retain-failed"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use restaurant_sync::{DEFAULT_RETENTION, ReplayPolicy, SyncOptions};
use serde::{Deserialize, Serialize};

/// Upper bound for any per-request timeout.
const MAX_TIMEOUT_SECS: u64 = 300;

/// Client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub sync: SyncConfig,
}

impl Config {
    /// Load configuration from the default path, falling back to defaults
    /// when the file does not exist.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Write configuration to a file, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Check every section, collecting all problems rather than stopping
    /// at the first.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.api.validate());
        errors.extend(self.storage.validate());
        errors.extend(self.sync.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Options for the sync coordinator.
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions::default()
            .retention(self.sync.retention)
            .replay_policy(self.sync.replay_policy)
    }
}

/// Remote API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the restaurant API.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1337".to_string(),
            timeout_secs: 10,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.base_url.trim().is_empty() {
            errors.push(ValidationError {
                field: "api.base_url".to_string(),
                message: "base URL cannot be empty".to_string(),
            });
        } else if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            errors.push(ValidationError {
                field: "api.base_url".to_string(),
                message: format!("'{}' must start with http:// or https://", self.base_url),
            });
        }

        if self.timeout_secs == 0 || self.timeout_secs > MAX_TIMEOUT_SECS {
            errors.push(ValidationError {
                field: "api.timeout_secs".to_string(),
                message: format!(
                    "timeout must be between 1 and {} seconds, got {}",
                    MAX_TIMEOUT_SECS, self.timeout_secs
                ),
            });
        }

        errors
    }
}

/// Local cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the SQLite cache.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: restaurant_store::default_db_path(),
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.path.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "storage.path".to_string(),
                message: "database path cannot be empty".to_string(),
            });
        }

        errors
    }
}

/// Offline queue settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Restaurants and reviews kept in the cache.
    pub retention: usize,
    /// What happens to reviews the server rejects during replay.
    pub replay_policy: ReplayPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            retention: DEFAULT_RETENTION,
            replay_policy: ReplayPolicy::default(),
        }
    }
}

impl SyncConfig {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.retention == 0 {
            errors.push(ValidationError {
                field: "sync.retention".to_string(),
                message: "retention must keep at least one record".to_string(),
            });
        }

        errors
    }
}

/// Errors from loading or saving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation problem.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Dotted field path, e.g. `api.base_url`.
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("restaurant-reviews")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.api.base_url = "https://reviews.example.com".to_string();
        config.sync.retention = 50;
        config.sync.replay_policy = ReplayPolicy::LossyClear;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        loaded.validate().unwrap();
        assert_eq!(loaded.api.base_url, "https://reviews.example.com");
        assert_eq!(loaded.sync.retention, 50);
        assert_eq!(loaded.sync.replay_policy, ReplayPolicy::LossyClear);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sync]\nreplay_policy = \"lossy-clear\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.sync.replay_policy, ReplayPolicy::LossyClear);
        assert_eq!(config.sync.retention, DEFAULT_RETENTION);
        assert_eq!(config.api.timeout_secs, 10);
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/restaurants/config.toml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api\nbase_url = 1").unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = Config::default();
        config.api.base_url = "ftp://example.com".to_string();
        config.api.timeout_secs = 0;
        config.storage.path = PathBuf::new();
        config.sync.retention = 0;

        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(
                    fields,
                    [
                        "api.base_url",
                        "api.timeout_secs",
                        "storage.path",
                        "sync.retention"
                    ]
                );
            }
            other => panic!("expected validation errors, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_error_display() {
        let err = ConfigError::Validation(vec![ValidationError {
            field: "api.base_url".to_string(),
            message: "base URL cannot be empty".to_string(),
        }]);
        assert_eq!(
            err.to_string(),
            "Configuration validation failed:\n  - api.base_url: base URL cannot be empty"
        );
    }

    #[test]
    fn test_sync_options_from_config() {
        let mut config = Config::default();
        config.sync.retention = 5;
        let options = config.sync_options();
        assert_eq!(options.retention, 5);
        assert_eq!(options.replay_policy, ReplayPolicy::RetainFailed);
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert!(path.ends_with("restaurant-reviews/config.toml"));
    }
}
