//! Viewer configuration: bridge timing, default options and view command.
//!
//! Loaded from `config.yaml` (or any `.toml` file) under the platform config
//! directory. A missing file is not an error; the defaults apply.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::language::Language;
use crate::options::{DiffOptions, OptionsMap};

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "CODE_DIFF_VIEW_CONFIG";

/// Directory name under the platform config directory.
const CONFIG_DIR_NAME: &str = "code-diff-view";

/// Timing windows for the bridge channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// How long the view may take to signal readiness after mount.
    #[serde(default = "crate::defaults::mount_timeout_ms")]
    pub mount_timeout_ms: u64,
    /// How long a sent request may wait for its response.
    #[serde(default = "crate::defaults::response_timeout_ms")]
    pub response_timeout_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            mount_timeout_ms: crate::defaults::mount_timeout_ms(),
            response_timeout_ms: crate::defaults::response_timeout_ms(),
        }
    }
}

impl BridgeConfig {
    pub fn mount_timeout(&self) -> Duration {
        Duration::from_millis(self.mount_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

/// Top-level viewer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub bridge: BridgeConfig,
    /// Language used when a render call does not name one.
    #[serde(default = "crate::defaults::default_language")]
    pub default_language: String,
    /// Options applied underneath every render call's own options.
    #[serde(default)]
    pub defaults: OptionsMap,
    /// Command line for an out-of-process view (stdio transport).
    #[serde(default)]
    pub view_command: Option<String>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            bridge: BridgeConfig::default(),
            default_language: crate::defaults::default_language(),
            defaults: OptionsMap::new(),
            view_command: None,
        }
    }
}

impl ViewerConfig {
    /// Load from the resolved config path, or defaults when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if !path.exists() {
            log::info!("No viewer config at {path:?}, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path. `.toml` files are parsed as TOML,
    /// everything else as YAML.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        log::info!("Loading viewer config from {path:?}");
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = if contents.trim().is_empty() {
            Self::default()
        } else if is_toml(path) {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                details: e.to_string(),
            })?
        } else {
            serde_yaml_ng::from_str(&contents).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                details: e.to_string(),
            })?
        };

        config.validate()?;
        Ok(config)
    }

    /// Resolve the config file path.
    ///
    /// Checks `CODE_DIFF_VIEW_CONFIG` first, then falls back to
    /// `<config_dir>/code-diff-view/config.yaml`.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".config")
            })
            .join(CONFIG_DIR_NAME)
            .join("config.yaml")
    }

    /// Reject settings the bridge cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bridge.mount_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "bridge.mount_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.bridge.response_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "bridge.response_timeout_ms must be greater than zero".to_string(),
            ));
        }
        // Surface malformed defaults at load time rather than on first render.
        self.default_options()?;
        Ok(())
    }

    /// The configured defaults normalized over the built-in defaults.
    pub fn default_options(&self) -> Result<DiffOptions, ConfigError> {
        DiffOptions::default().overlay(&self.defaults)
    }

    /// The configured default language.
    pub fn language(&self) -> Language {
        Language::from_name(&self.default_language)
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}
