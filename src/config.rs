//! Application configuration.
//!
//! A JSON file with the same role as the original system's `config.json`:
//! every field has a default, a missing file is a warning rather than an
//! error, and CLI flags override whatever was loaded.

use std::fs;
use std::io;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("config file is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

fn default_sample_rate_hz() -> f64 {
    10.0
}
fn default_calibration_dir() -> String {
    ".".to_string()
}
fn default_connect_retries() -> u32 {
    3
}
fn default_read_failure_threshold() -> u32 {
    5
}
fn default_source() -> SourceKind {
    SourceKind::Simulated
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Simulated,
    Hardware,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Nominal polling cadence of the orientation service.
    #[serde(default = "default_sample_rate_hz")]
    pub sample_rate_hz: f64,
    /// Directory holding the per-method calibration record files.
    #[serde(default = "default_calibration_dir")]
    pub calibration_dir: String,
    /// Bounded connect attempts before startup is fatal.
    #[serde(default = "default_connect_retries")]
    pub connect_retries: u32,
    /// Consecutive read failures before the service degrades.
    #[serde(default = "default_read_failure_threshold")]
    pub read_failure_threshold: u32,
    #[serde(default = "default_source")]
    pub source: SourceKind,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: default_sample_rate_hz(),
            calibration_dir: default_calibration_dir(),
            connect_retries: default_connect_retries(),
            read_failure_threshold: default_read_failure_threshold(),
            source: default_source(),
        }
    }
}

impl AppConfig {
    /// Load from a JSON file; a missing file yields defaults with a warning.
    /// Any other read failure, and any malformed content, is an error (a
    /// typo or a permission problem should not silently race with defaults).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(
                    "config file {} not found, using default settings",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    pub fn sample_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.sample_rate_hz.max(0.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let cfg = AppConfig::load("/definitely/not/a/real/config.json").unwrap();
        assert_eq!(cfg.sample_rate_hz, 10.0);
        assert_eq!(cfg.source, SourceKind::Simulated);
        assert_eq!(cfg.connect_retries, 3);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let cfg: AppConfig =
            serde_json::from_str(r#"{"sample_rate_hz": 20.0, "source": "hardware"}"#).unwrap();
        assert_eq!(cfg.sample_rate_hz, 20.0);
        assert_eq!(cfg.source, SourceKind::Hardware);
        assert_eq!(cfg.read_failure_threshold, 5);
    }

    #[test]
    fn test_sample_interval() {
        let cfg = AppConfig {
            sample_rate_hz: 10.0,
            ..AppConfig::default()
        };
        assert_eq!(cfg.sample_interval(), std::time::Duration::from_millis(100));
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let bad: Result<AppConfig, _> = serde_json::from_str(r#"{"sample_rate_hz": "fast"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_unreadable_file_is_not_defaulted() {
        // A directory exists but cannot be read as a file; that must surface
        // as an I/O error, not quietly become the default config
        let result = AppConfig::load(std::env::temp_dir());
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
