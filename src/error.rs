//! Errors surfaced by the host-side [`crate::DiffViewer`].

use code_diff_bridge::{BridgeError, TransportError};
use code_diff_config::ConfigError;
use thiserror::Error;

/// Failure of a host render call.
///
/// Render-level failures (for example a bad `ignoreMatchingLines` pattern)
/// are not errors here: they come back as a `DiffResult` with `error` set.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Options or configuration could not be normalized. Nothing was sent.
    #[error("invalid diff options: {0}")]
    Config(#[from] ConfigError),

    /// The exchange with the view failed.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// The view could not be started.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ViewerError {
    /// Whether the failure is an intentional cancellation rather than a fault.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ViewerError::Bridge(e) if e.is_cancellation())
    }
}
