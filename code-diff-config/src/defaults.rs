//! Default value functions for configuration.
//!
//! Used by the `Default` impls and as `#[serde(default = "...")]`
//! attributes, so an absent field never leaves an option undefined.

use crate::options::{DiffStyle, OutputFormat};

// ── Diff options ───────────────────────────────────────────────────────────

pub fn output_format() -> OutputFormat {
    OutputFormat::SideBySide
}

pub fn diff_style() -> DiffStyle {
    DiffStyle::Word
}

pub fn context() -> u32 {
    5
}

// ── Bridge timing ──────────────────────────────────────────────────────────

pub fn mount_timeout_ms() -> u64 {
    5_000
}

pub fn response_timeout_ms() -> u64 {
    3_000
}

// ── Viewer ─────────────────────────────────────────────────────────────────

pub fn default_language() -> String {
    "plaintext".to_string()
}
