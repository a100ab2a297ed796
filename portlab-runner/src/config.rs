//! Simulation manager configuration, loaded from TOML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest retention accepted for completed results: one year.
pub const MAX_RESULT_TTL_SECS: u64 = 366 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Sizing and housekeeping knobs for [`SimulationManager`](crate::SimulationManager).
///
/// Every field has a default, so an empty TOML document is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Worker threads running simulation jobs.
    pub workers: usize,
    /// Jobs that may wait for a worker before starts are rejected.
    pub queue_capacity: usize,
    /// Seconds between eviction sweeps.
    pub sweep_interval_secs: u64,
    /// Seconds a completed result stays retrievable.
    pub result_ttl_secs: u64,
    /// Fixed master seed for reproducible runs. A fresh seed is drawn per job when absent.
    pub master_seed: Option<u64>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 100,
            sweep_interval_secs: 300,
            result_ttl_secs: 1800,
            master_seed: None,
        }
    }
}

impl ManagerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a config document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid("queue_capacity must be at least 1".into()));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid("sweep_interval_secs must be at least 1".into()));
        }
        if self.result_ttl_secs > MAX_RESULT_TTL_SECS {
            return Err(ConfigError::Invalid(format!(
                "result_ttl_secs must be at most {MAX_RESULT_TTL_SECS}"
            )));
        }
        Ok(())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn result_ttl(&self) -> chrono::Duration {
        i64::try_from(self.result_ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = ManagerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ManagerConfig::default());
        assert_eq!(config.workers, 4);
        assert_eq!(config.queue_capacity, 100);
        assert_eq!(config.result_ttl(), chrono::Duration::minutes(30));
        assert_eq!(config.sweep_interval(), Duration::from_secs(300));
    }

    #[test]
    fn partial_document_overrides_fields() {
        let config = ManagerConfig::from_toml_str(
            r#"
workers = 2
master_seed = 42
"#,
        )
        .unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.master_seed, Some(42));
        assert_eq!(config.queue_capacity, 100);
    }

    #[test]
    fn zero_workers_is_invalid() {
        let err = ManagerConfig::from_toml_str("workers = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn oversized_ttl_is_invalid() {
        let err = ManagerConfig::from_toml_str("result_ttl_secs = 10000000000000000").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let year = format!("result_ttl_secs = {MAX_RESULT_TTL_SECS}");
        let config = ManagerConfig::from_toml_str(&year).unwrap();
        assert_eq!(config.result_ttl(), chrono::Duration::days(366));
    }

    #[test]
    fn unvalidated_huge_ttl_saturates() {
        let config = ManagerConfig {
            result_ttl_secs: u64::MAX,
            ..ManagerConfig::default()
        };
        assert_eq!(config.result_ttl(), chrono::Duration::MAX);

        let config = ManagerConfig {
            result_ttl_secs: 10_000_000_000_000_000,
            ..ManagerConfig::default()
        };
        assert_eq!(config.result_ttl(), chrono::Duration::MAX);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = ManagerConfig::from_toml_str("workers = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ManagerConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
