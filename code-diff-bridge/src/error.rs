//! Typed error types for the bridge.
//!
//! Channel-level failures ([`BridgeError`]) abort a render attempt. Failures
//! inside the view's own rendering never show up here; they travel inside the
//! response's `error` field and reach the host as a successful exchange.

use std::time::Duration;

use code_diff_config::ConfigError;
use thiserror::Error;

use crate::channel::ChannelState;
use crate::codec::RenderId;

/// Failure of a bridge exchange.
///
/// `Clone` so a single outcome can be fanned out to every handle waiting on
/// the same render identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The view did not signal readiness within the mount window.
    #[error("view failed to mount: {0}")]
    Mount(String),

    /// No response arrived within the response window.
    #[error("no response for render {render_id} within {}ms", .after.as_millis())]
    Timeout {
        /// Identity of the request that timed out.
        render_id: RenderId,
        /// The window that elapsed.
        after: Duration,
    },

    /// The channel was torn down while the render was pending.
    #[error("render cancelled by teardown")]
    Cancelled,

    /// A newer request replaced this one before its response arrived.
    #[error("render {render_id} superseded by {by}")]
    Superseded {
        /// Identity of the superseded request.
        render_id: RenderId,
        /// Identity of the request that replaced it.
        by: RenderId,
    },

    /// `send` was called before mount completed or after teardown.
    #[error("bridge channel is not ready (state: {0})")]
    NotReady(ChannelState),

    /// The view's event stream ended unexpectedly.
    #[error("view disconnected")]
    Disconnected,

    /// The transport could not deliver the request.
    #[error("view transport error: {0}")]
    Transport(String),
}

impl BridgeError {
    /// Whether this outcome is an intentional cancellation (teardown or a
    /// newer request) that the host should not present as a failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, BridgeError::Cancelled | BridgeError::Superseded { .. })
    }
}

/// Failure to decode a wire request on the view side.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload was not valid JSON or lacked required fields.
    #[error("malformed wire request: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The request was produced by a newer host than this view understands.
    #[error("unsupported protocol version {found} (supported up to {supported})")]
    UnsupportedVersion {
        /// Version carried by the request.
        found: u32,
        /// Highest version this build understands.
        supported: u32,
    },

    /// The options object could not be normalized.
    #[error(transparent)]
    Options(#[from] ConfigError),
}

/// Rejection of a raw view response.
#[derive(Debug, Error)]
pub enum ResultError {
    /// The response was not a JSON object of the expected shape.
    #[error("malformed view response: {0}")]
    Malformed(String),

    /// The response does not correlate with the outstanding request.
    #[error("response render id {found:?} does not match outstanding render {expected}")]
    UnknownRenderId {
        /// Identity of the outstanding request.
        expected: RenderId,
        /// Identity carried by the response, if any.
        found: Option<RenderId>,
    },
}

/// Failure inside a [`crate::ViewTransport`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// The view side is gone.
    #[error("view transport is closed")]
    Closed,

    /// The request could not be serialized.
    #[error("failed to serialize request: {0}")]
    Encode(#[from] serde_json::Error),

    /// The view command line could not be parsed.
    #[error("invalid view command '{command}': {reason}")]
    InvalidCommand {
        /// The command line as configured.
        command: String,
        /// Parser error message.
        reason: String,
    },

    /// The view subprocess could not be started.
    #[error("failed to spawn view '{command}': {source}")]
    Spawn {
        /// The program that failed to start.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to the view failed.
    #[error("view I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_classification() {
        assert!(BridgeError::Cancelled.is_cancellation());
        assert!(
            BridgeError::Superseded {
                render_id: RenderId::new("a"),
                by: RenderId::new("b"),
            }
            .is_cancellation()
        );
        assert!(!BridgeError::Disconnected.is_cancellation());
        assert!(!BridgeError::Mount("slow".to_string()).is_cancellation());
    }

    #[test]
    fn test_timeout_display() {
        let err = BridgeError::Timeout {
            render_id: RenderId::new("abc123"),
            after: Duration::from_millis(1500),
        };
        assert_eq!(
            err.to_string(),
            "no response for render abc123 within 1500ms"
        );
    }

    #[test]
    fn test_not_ready_display_names_state() {
        let err = BridgeError::NotReady(ChannelState::Mounting);
        assert_eq!(
            err.to_string(),
            "bridge channel is not ready (state: mounting)"
        );
    }
}
