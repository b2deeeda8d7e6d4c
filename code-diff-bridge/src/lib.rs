//! code-diff-bridge: the component bridge protocol between a host and an
//! embedded diff view.
//!
//! # Architecture
//!
//! - [`protocol`] - wire types exchanged with the view (request, response, ready signal)
//! - [`codec`] - request encoding/decoding and the content-derived [`RenderId`]
//! - [`result`] - validation and default-filling of view responses into [`DiffResult`]
//! - [`transport`] - the [`ViewTransport`] and [`RenderEngine`] seams
//! - [`channel`] - the [`BridgeChannel`] actor (mount, send, supersede, timeout, teardown)
//! - [`local`] - an in-process view host for any [`RenderEngine`]
//! - [`stdio`] - JSON-lines transport to a view subprocess, and the matching view-side server
//!
//! # Example
//!
//! ```ignore
//! use code_diff_bridge::{BridgeChannel, LocalView, codec};
//!
//! let (transport, events) = LocalView::spawn(engine);
//! let channel = BridgeChannel::mount(transport, events, BridgeConfig::default());
//! channel.wait_ready().await?;
//!
//! let request = codec::encode("a\n", "b\n", Language::Plaintext, DiffOptions::default());
//! let result = channel.send(request).result().await?;
//! println!("+{} -{}", result.lines_added, result.lines_removed);
//! ```

pub mod channel;
pub mod codec;
pub mod error;
pub mod local;
pub mod protocol;
pub mod result;
pub mod stdio;
pub mod transport;

pub use channel::{BridgeChannel, ChannelId, ChannelState, RenderHandle};
pub use codec::RenderId;
pub use error::{BridgeError, CodecError, ResultError, TransportError};
pub use local::{LocalTransport, LocalView};
pub use protocol::{PROTOCOL_VERSION, ViewEvent, ViewResponse, WireRequest};
pub use result::DiffResult;
pub use stdio::{StdioTransport, serve_stdio};
pub use transport::{RenderEngine, ViewTransport};
