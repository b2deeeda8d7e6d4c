//! code-diff-view: host facade, reference render engine and CLI support for
//! the embedded code diff view.
//!
//! The protocol itself lives in `code-diff-bridge`; the options model and
//! viewer configuration in `code-diff-config`. This crate ties them together:
//!
//! - [`DiffViewer`] - mount a view and render diffs with a single call
//! - [`LineDiffEngine`] - the reference view renderer (line counts via `similar`)
//! - [`debug`] - the stderr logging backend used by the `code-diff` binary

/// Application version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod debug;
pub mod engine;
pub mod error;
pub mod viewer;

pub use code_diff_bridge::{BridgeError, ChannelState, DiffResult};
pub use code_diff_config::{DiffOptions, Language, OptionsMap, ViewerConfig};
pub use engine::LineDiffEngine;
pub use error::ViewerError;
pub use viewer::DiffViewer;
