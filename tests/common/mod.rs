//! Shared integration test helpers for code-diff-view.
//!
//! Include with `mod common;` at the top of a test file. The
//! `#[allow(dead_code)]` attribute suppresses warnings when a file uses only
//! some helpers.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use code_diff_view::{DiffViewer, OptionsMap, ViewerConfig};
use serde_json::Value;
use tempfile::TempDir;

/// A viewer running the reference engine in-process with default settings.
pub fn local_viewer() -> DiffViewer {
    DiffViewer::local(&ViewerConfig::default()).expect("Failed to mount local viewer")
}

/// Convert a `json!` object literal into an options map.
pub fn options(value: Value) -> OptionsMap {
    value
        .as_object()
        .cloned()
        .expect("options literal must be a JSON object")
}

/// Write `contents` to `name` inside a fresh temp dir.
///
/// The `TempDir` must outlive every use of the returned path.
pub fn write_temp(name: &str, contents: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("Failed to write temp file");
    (dir, path)
}
