//! Typed error variants for the code-diff-config crate.
//!
//! Covers both option normalization (raised before any request reaches the
//! view) and viewer config file I/O.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while normalizing diff options or loading viewer config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An option value had the wrong shape and could not be defaulted or clamped.
    #[error("Invalid value for diff option '{key}': {reason}")]
    InvalidOption {
        /// Canonical (camelCase) option name.
        key: String,
        /// Human-readable description of what was expected.
        reason: String,
    },

    /// The options value was not a JSON object at all.
    #[error("Diff options must be an object, got {0}")]
    NotAnObject(String),

    /// The config file could not be read.
    #[error("I/O error reading config {path:?}: {source}")]
    Io {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file was not valid YAML/TOML for [`crate::ViewerConfig`].
    #[error("Failed to parse config {path:?}: {details}")]
    Parse {
        /// Path that failed to parse.
        path: PathBuf,
        /// Parser error message.
        details: String,
    },

    /// A field value failed semantic validation.
    #[error("Config validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    pub(crate) fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidOption {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
