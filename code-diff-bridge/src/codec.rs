//! Request codec and render identity.
//!
//! The render identity is a SHA-256 fingerprint over a length-prefixed
//! framing of every field that affects what the view shows, so two requests
//! that differ in any field never share an identity (short of a hash
//! collision, which at worst causes an extra render).

use std::fmt;

use code_diff_config::{DiffOptions, Language};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::CodecError;
use crate::protocol::{PROTOCOL_VERSION, WireRequest};

/// Opaque identity correlating a request with its response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderId(String);

impl RenderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log lines.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(12)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Display for RenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the render identity for a request's inputs.
pub fn fingerprint(
    old_text: &str,
    new_text: &str,
    language: Language,
    options: &DiffOptions,
) -> RenderId {
    let mut hasher = Sha256::new();
    frame(&mut hasher, b"oldText", old_text.as_bytes());
    frame(&mut hasher, b"newText", new_text.as_bytes());
    frame(&mut hasher, b"language", language.as_str().as_bytes());
    for (key, value) in options.to_map() {
        frame(&mut hasher, key.as_bytes(), value.to_string().as_bytes());
    }
    RenderId(format!("{:x}", hasher.finalize()))
}

fn frame(hasher: &mut Sha256, tag: &[u8], bytes: &[u8]) {
    hasher.update((tag.len() as u64).to_be_bytes());
    hasher.update(tag);
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

/// Build the wire request for a diff. Never fails.
pub fn encode(
    old_text: impl Into<String>,
    new_text: impl Into<String>,
    language: Language,
    options: DiffOptions,
) -> WireRequest {
    let old_text = old_text.into();
    let new_text = new_text.into();
    let render_id = fingerprint(&old_text, &new_text, language, &options);
    WireRequest {
        protocol_version: PROTOCOL_VERSION,
        old_text,
        new_text,
        language,
        options,
        render_id,
    }
}

/// Serialize a request as a single JSON line (no trailing newline).
pub fn to_line(request: &WireRequest) -> Result<String, serde_json::Error> {
    serde_json::to_string(request)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRequest {
    #[serde(default)]
    protocol_version: Option<u32>,
    old_text: String,
    new_text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    options: Value,
    #[serde(default)]
    render_id: Option<RenderId>,
}

/// Decode a request on the view side.
///
/// Options go back through the options model, so the result always carries
/// defaulted fields and a non-negative context. A missing `renderId` is
/// recomputed from the content.
pub fn decode(payload: &str) -> Result<WireRequest, CodecError> {
    let value: Value = serde_json::from_str(payload)?;
    decode_value(value)
}

/// [`decode`] for an already-parsed JSON value.
pub fn decode_value(value: Value) -> Result<WireRequest, CodecError> {
    let raw: RawRequest = serde_json::from_value(value)?;
    let version = raw.protocol_version.unwrap_or(PROTOCOL_VERSION);
    if version > PROTOCOL_VERSION {
        return Err(CodecError::UnsupportedVersion {
            found: version,
            supported: PROTOCOL_VERSION,
        });
    }

    let language = Language::resolve(raw.language.as_deref());
    let options = DiffOptions::from_value(&raw.options)?;
    let render_id = raw
        .render_id
        .unwrap_or_else(|| fingerprint(&raw.old_text, &raw.new_text, language, &options));

    Ok(WireRequest {
        protocol_version: version,
        old_text: raw.old_text,
        new_text: raw.new_text,
        language,
        options,
        render_id,
    })
}
