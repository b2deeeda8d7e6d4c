//! In-process view host.
//!
//! [`LocalView::spawn`] runs any [`RenderEngine`] as an independent tokio
//! task that speaks the same protocol as an out-of-process view: it signals
//! readiness, renders requests in arrival order, and answers with raw JSON
//! responses.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::protocol::{ViewEvent, WireRequest};
use crate::transport::{RenderEngine, ViewTransport};

/// Factory for in-process views.
pub struct LocalView;

impl LocalView {
    /// Spawn a view task around `engine`.
    ///
    /// Returns the transport and event stream to pass to
    /// [`crate::BridgeChannel::mount`]. Must be called within a tokio runtime.
    pub fn spawn<E: RenderEngine>(
        engine: E,
    ) -> (LocalTransport, mpsc::UnboundedReceiver<ViewEvent>) {
        let engine = Arc::new(engine);
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<WireRequest>();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            if event_tx.send(ViewEvent::Ready).is_err() {
                return;
            }
            while let Some(request) = request_rx.recv().await {
                let engine = Arc::clone(&engine);
                let rendered =
                    tokio::task::spawn_blocking(move || engine.render(&request)).await;
                let response = match rendered {
                    Ok(response) => response,
                    Err(e) => {
                        log::error!("Local view: render task failed: {e}");
                        continue;
                    }
                };
                let value = match serde_json::to_value(&response) {
                    Ok(value) => value,
                    Err(e) => {
                        log::error!("Local view: failed to serialize response: {e}");
                        continue;
                    }
                };
                if event_tx.send(ViewEvent::Response(value)).is_err() {
                    break;
                }
            }
            log::debug!("Local view: stopped");
        });

        (
            LocalTransport {
                tx: Some(request_tx),
            },
            event_rx,
        )
    }
}

/// Transport half of a [`LocalView`].
pub struct LocalTransport {
    tx: Option<mpsc::UnboundedSender<WireRequest>>,
}

impl ViewTransport for LocalTransport {
    fn post(&mut self, request: &WireRequest) -> Result<(), TransportError> {
        let tx = self.tx.as_ref().ok_or(TransportError::Closed)?;
        tx.send(request.clone()).map_err(|_| TransportError::Closed)
    }

    fn close(&mut self) {
        // Dropping the sender ends the view task once it drains.
        self.tx.take();
    }
}
