//! The two seams between the bridge and the embedded view.
//!
//! [`ViewTransport`] is how the channel reaches the view: a messaging handle,
//! not ownership. [`RenderEngine`] is whatever turns a request into a
//! response inside the view; the bridge never assumes a particular diff
//! algorithm.

use crate::error::TransportError;
use crate::protocol::{ViewResponse, WireRequest};

/// Outbound half of a connection to an embedded view.
///
/// Inbound traffic (readiness, responses) arrives separately as a stream of
/// [`crate::ViewEvent`]s handed to [`crate::BridgeChannel::mount`].
pub trait ViewTransport: Send + 'static {
    /// Hand a request to the view. Must not block waiting for the render.
    fn post(&mut self, request: &WireRequest) -> Result<(), TransportError>;

    /// Release the view. Called once when the channel unmounts.
    fn close(&mut self) {}
}

/// Anything that can consume a request and produce a response.
pub trait RenderEngine: Send + Sync + 'static {
    fn render(&self, request: &WireRequest) -> ViewResponse;
}

impl<F> RenderEngine for F
where
    F: Fn(&WireRequest) -> ViewResponse + Send + Sync + 'static,
{
    fn render(&self, request: &WireRequest) -> ViewResponse {
        self(request)
    }
}
