//! Configuration for kando.
//!
//! Configuration is layered:
//! 1. Built-in defaults
//! 2. A JSON file: the explicit path, or `~/.config/kando/kando.json` when present
//! 3. Environment overrides: `KANDO_SWEEP_INTERVAL_MS`, `KANDO_PROBE_KEY`,
//!    `KANDO_LOG_LEVEL`

use crate::error::ConfigError;
use kando_storage::DEFAULT_PROBE_KEY;
use kando_util::LogLevel;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Default period between expiration sweeps.
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 15_000;

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KandoConfig {
    /// Milliseconds between expiration sweep ticks.
    pub sweep_interval_ms: u64,

    /// Sentinel key used to probe whether a medium accepts writes.
    pub probe_key: String,

    /// Log level for binaries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
}

impl Default for KandoConfig {
    fn default() -> Self {
        Self {
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            probe_key: DEFAULT_PROBE_KEY.to_string(),
            log_level: None,
        }
    }
}

impl KandoConfig {
    /// Load configuration from defaults, a config file and the environment.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match kando_util::path::default_config_file() {
                Some(default) if default.exists() => Self::from_file(&default)?,
                _ => Self::default(),
            },
        };

        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let shown = path.display().to_string();
        debug!(path = %shown, "Loading config file");

        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: shown.clone(),
                }
            } else {
                ConfigError::Read {
                    path: shown.clone(),
                    source: e,
                }
            }
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidJson {
            path: shown,
            message: e.to_string(),
        })
    }

    /// Apply `KANDO_*` overrides using `lookup` to read variables.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("KANDO_SWEEP_INTERVAL_MS") {
            self.sweep_interval_ms =
                value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                    name: "KANDO_SWEEP_INTERVAL_MS".to_string(),
                    value: value.clone(),
                })?;
        }

        if let Some(value) = lookup("KANDO_PROBE_KEY") {
            self.probe_key = value;
        }

        if let Some(value) = lookup("KANDO_LOG_LEVEL") {
            let level = value.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "KANDO_LOG_LEVEL".to_string(),
                value: value.clone(),
            })?;
            self.log_level = Some(level);
        }

        Ok(())
    }

    /// Reject settings the adapter cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sweep_interval_ms == 0 {
            return Err(ConfigError::Validation {
                message: "sweep_interval_ms must be positive".to_string(),
            });
        }
        if self.probe_key.is_empty() {
            return Err(ConfigError::Validation {
                message: "probe_key must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}
