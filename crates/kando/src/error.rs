//! Error types for the kando crate.

use kando_storage::StorageError;
use thiserror::Error;

/// Result type for kando operations.
pub type KandoResult<T> = Result<T, KandoError>;

/// Errors returned by [`Kando`](crate::Kando) operations.
#[derive(Debug, Error)]
pub enum KandoError {
    /// The underlying medium failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A namespace root holds JSON that cannot be parsed, or a value could
    /// not be converted.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The type path cannot be split into a medium and a path.
    #[error("invalid type path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl KandoError {
    pub(crate) fn invalid_path(path: &str, reason: &'static str) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
            reason,
        }
    }
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("cannot read config at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file not found.
    #[error("config file not found: {path}")]
    NotFound { path: String },

    /// Invalid JSON syntax or shape.
    #[error("invalid config at {path}: {message}")]
    InvalidJson { path: String, message: String },

    /// Environment override could not be parsed.
    #[error("invalid value {value:?} for {name}")]
    InvalidEnv { name: String, value: String },

    /// Config validation failed.
    #[error("config validation failed: {message}")]
    Validation { message: String },
}
