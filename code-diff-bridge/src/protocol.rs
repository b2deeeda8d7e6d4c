//! Wire types exchanged between the host and the embedded view.
//!
//! Host → view: a [`WireRequest`] (one JSON object per message).
//! View → host: either the `{"type": "ready"}` control message or a
//! [`ViewResponse`]. On line-oriented transports each message is one line.

use code_diff_config::{DiffOptions, Language};
use serde::Serialize;
use serde_json::Value;

use crate::codec::RenderId;

/// Current wire protocol version. Not part of the render identity.
pub const PROTOCOL_VERSION: u32 = 1;

/// `type` value of the view's readiness signal.
pub const READY_MESSAGE_TYPE: &str = "ready";

/// A diff request as sent to the view.
///
/// Built by [`crate::codec::encode`] (host side) or
/// [`crate::codec::decode`] (view side); both guarantee fully-populated
/// options and a render identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRequest {
    pub protocol_version: u32,
    pub old_text: String,
    pub new_text: String,
    pub language: Language,
    pub options: DiffOptions,
    pub render_id: RenderId,
}

/// A response as produced by the view.
///
/// Every field is optional on the wire. Parse with
/// [`ViewResponse::from_value`]; [`crate::result::validate`] fills defaults
/// and checks correlation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_id: Option<RenderId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines_added: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines_removed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_options: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ViewResponse {
    /// A successful render of `request` with the given counts.
    pub fn rendered(request: &WireRequest, lines_added: u64, lines_removed: u64) -> Self {
        Self {
            render_id: Some(request.render_id.clone()),
            lines_added: Some(saturating_i64(lines_added)),
            lines_removed: Some(saturating_i64(lines_removed)),
            applied_options: serde_json::to_value(&request.options).ok(),
            error: None,
        }
    }

    /// A failed render of `request`: zero counts and the error populated.
    pub fn failed(request: &WireRequest, error: impl Into<String>) -> Self {
        Self {
            render_id: Some(request.render_id.clone()),
            lines_added: Some(0),
            lines_removed: Some(0),
            applied_options: serde_json::to_value(&request.options).ok(),
            error: Some(error.into()),
        }
    }
}

fn saturating_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Something the view told the bridge channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// The view finished mounting and can accept requests.
    Ready,
    /// A raw response, validated later against the outstanding request.
    Response(Value),
}

impl ViewEvent {
    /// Classify one line of view output.
    ///
    /// Returns `Ok(None)` for control messages this version does not know,
    /// so a newer view can add message types without breaking older hosts.
    pub fn parse_line(line: &str) -> Result<Option<ViewEvent>, serde_json::Error> {
        let value: Value = serde_json::from_str(line)?;
        match value.get("type").and_then(Value::as_str) {
            Some(READY_MESSAGE_TYPE) => Ok(Some(ViewEvent::Ready)),
            Some(other) => {
                log::debug!("Ignoring unknown view message type '{other}'");
                Ok(None)
            }
            None => Ok(Some(ViewEvent::Response(value))),
        }
    }

    /// The readiness signal as a single JSON line (no trailing newline).
    pub fn ready_line() -> String {
        serde_json::json!({ "type": READY_MESSAGE_TYPE }).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;

    #[test]
    fn test_wire_request_field_names() {
        let request = codec::encode("a\n", "b\n", Language::Json, DiffOptions::default());
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["protocolVersion"], 1);
        assert_eq!(value["oldText"], "a\n");
        assert_eq!(value["newText"], "b\n");
        assert_eq!(value["language"], "json");
        assert_eq!(value["renderId"], request.render_id.as_str());
        let options = value["options"].as_object().unwrap();
        for key in [
            "outputFormat",
            "diffStyle",
            "context",
            "trimWhitespace",
            "ignoreLineEndings",
            "height",
            "forceInlineComparison",
            "hideHeader",
            "hideStat",
            "ignoreMatchingLines",
            "filename",
        ] {
            assert!(options.contains_key(key), "missing option {key}");
        }
    }

    #[test]
    fn test_parse_ready_line() {
        assert_eq!(
            ViewEvent::parse_line(&ViewEvent::ready_line()).unwrap(),
            Some(ViewEvent::Ready)
        );
    }

    #[test]
    fn test_parse_response_line() {
        let event = ViewEvent::parse_line(r#"{"renderId":"x","linesAdded":2}"#).unwrap();
        match event {
            Some(ViewEvent::Response(value)) => assert_eq!(value["linesAdded"], 2),
            other => panic!("Expected Response, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_control_message_is_skipped() {
        assert_eq!(
            ViewEvent::parse_line(r#"{"type":"setFrameHeight","height":300}"#).unwrap(),
            None
        );
    }

    #[test]
    fn test_garbage_line_is_error() {
        assert!(ViewEvent::parse_line("not json").is_err());
    }

    #[test]
    fn test_failed_response_has_zero_counts() {
        let request = codec::encode("a", "b", Language::Plaintext, DiffOptions::default());
        let response = ViewResponse::failed(&request, "bad regex");
        assert_eq!(response.lines_added, Some(0));
        assert_eq!(response.lines_removed, Some(0));
        assert_eq!(response.error.as_deref(), Some("bad regex"));
        assert_eq!(response.render_id, Some(request.render_id));
    }

    #[test]
    fn test_view_response_omits_absent_fields() {
        let json = serde_json::to_string(&ViewResponse::default()).unwrap();
        assert_eq!(json, "{}");
    }
}
