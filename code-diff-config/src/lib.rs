//! Configuration system for the code-diff-view component bridge.
//!
//! This crate owns everything the host needs before a request is sent:
//!
//! - [`DiffOptions`] - the fully-populated options model and its normalization rules
//! - [`Language`] - the recognized language set with plain-text fallback
//! - [`ViewerConfig`] / [`BridgeConfig`] - file-based viewer settings (YAML or TOML)
//! - [`ConfigError`] - typed failures for normalization and config I/O

pub mod defaults;
pub mod error;
pub mod language;
pub mod options;
pub mod viewer;

pub use error::ConfigError;
pub use language::Language;
pub use options::{DiffOptions, DiffStyle, OptionKey, OptionsMap, OutputFormat, clamp_context};
pub use viewer::{BridgeConfig, CONFIG_PATH_ENV, ViewerConfig};
