//! Result model: turning a raw view response into a [`DiffResult`].

use code_diff_config::DiffOptions;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::RenderId;
use crate::error::ResultError;
use crate::protocol::{ViewResponse, WireRequest};

/// What the view rendered for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResult {
    pub lines_added: u64,
    pub lines_removed: u64,
    /// Options the view actually applied.
    pub applied_options: DiffOptions,
    pub render_id: RenderId,
    /// Render-level failure reported by the view. Counts are zero when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DiffResult {
    /// Whether the view rendered without a render-level error.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn total_changes(&self) -> u64 {
        self.lines_added.saturating_add(self.lines_removed)
    }
}

impl ViewResponse {
    /// Parse a raw JSON response.
    ///
    /// Only a non-object is rejected. Each field is read on its own so a
    /// badly typed count or error never hides the `renderId` of a response
    /// the view did complete.
    pub fn from_value(value: Value) -> Result<ViewResponse, ResultError> {
        let mut map = match value {
            Value::Object(map) => map,
            other => {
                return Err(ResultError::Malformed(format!(
                    "expected an object, got {other}"
                )));
            }
        };

        let render_id = match map.remove("renderId") {
            Some(Value::String(id)) => Some(RenderId::new(id)),
            None | Some(Value::Null) => None,
            Some(other) => {
                log::warn!("Ignoring non-string renderId {other}");
                None
            }
        };
        let applied_options = map.remove("appliedOptions");
        let error = match map.remove("error") {
            None | Some(Value::Null) => None,
            Some(Value::String(error)) => Some(error),
            Some(other) => Some(other.to_string()),
        };

        Ok(ViewResponse {
            lines_added: lenient_count(map.get("linesAdded"), "linesAdded"),
            lines_removed: lenient_count(map.get("linesRemoved"), "linesRemoved"),
            render_id,
            applied_options,
            error,
        })
    }
}

/// Read a count from whatever number-like value the view sent.
fn lenient_count(value: Option<&Value>, field: &str) -> Option<i64> {
    let value = value?;
    let count = match value {
        Value::Null => return None,
        Value::Number(n) => n.as_i64().or_else(|| {
            if n.as_u64().is_some() {
                Some(i64::MAX)
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f.clamp(i64::MIN as f64, i64::MAX as f64) as i64)
            }
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    if count.is_none() {
        log::warn!("Treating unparseable {field} {value} as 0");
    }
    count
}

/// Validate a response against the request it claims to answer.
///
/// Missing counts default to zero, missing `appliedOptions` default to the
/// options that were sent, and a partial `appliedOptions` is layered over
/// them. A response for any other identity is rejected.
pub fn validate(response: ViewResponse, sent: &WireRequest) -> Result<DiffResult, ResultError> {
    if response.render_id.as_ref() != Some(&sent.render_id) {
        return Err(ResultError::UnknownRenderId {
            expected: sent.render_id.clone(),
            found: response.render_id,
        });
    }

    let applied_options = match response.applied_options {
        None | Some(Value::Null) => sent.options.clone(),
        Some(Value::Object(map)) => sent.options.overlay(&map).unwrap_or_else(|e| {
            log::warn!(
                "Render {}: ignoring malformed appliedOptions ({e})",
                sent.render_id.short()
            );
            sent.options.clone()
        }),
        Some(other) => {
            log::warn!(
                "Render {}: appliedOptions is not an object ({other}), assuming sent options",
                sent.render_id.short()
            );
            sent.options.clone()
        }
    };

    let (lines_added, lines_removed) = if response.error.is_some() {
        (0, 0)
    } else {
        (
            count(response.lines_added, "linesAdded", &sent.render_id),
            count(response.lines_removed, "linesRemoved", &sent.render_id),
        )
    };

    Ok(DiffResult {
        lines_added,
        lines_removed,
        applied_options,
        render_id: sent.render_id.clone(),
        error: response.error,
    })
}

fn count(raw: Option<i64>, field: &str, render_id: &RenderId) -> u64 {
    match raw {
        None => 0,
        Some(n) if n < 0 => {
            log::warn!("Render {}: clamping negative {field} {n} to 0", render_id.short());
            0
        }
        Some(n) => n as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use code_diff_config::{Language, OutputFormat};
    use serde_json::json;

    fn request() -> WireRequest {
        codec::encode(
            "a\nb\n",
            "a\nc\n",
            Language::Plaintext,
            DiffOptions {
                context: 1,
                ..DiffOptions::default()
            },
        )
    }

    fn response(value: Value) -> ViewResponse {
        ViewResponse::from_value(value).unwrap()
    }

    #[test]
    fn test_full_response() {
        let sent = request();
        let result = validate(
            response(json!({
                "renderId": sent.render_id.as_str(),
                "linesAdded": 1,
                "linesRemoved": 1,
                "appliedOptions": sent.options.to_map(),
            })),
            &sent,
        )
        .unwrap();
        assert_eq!(result.lines_added, 1);
        assert_eq!(result.lines_removed, 1);
        assert_eq!(result.applied_options.context, 1);
        assert_eq!(result.total_changes(), 2);
        assert!(result.is_ok());
    }

    #[test]
    fn test_missing_fields_default() {
        let sent = request();
        let result = validate(
            response(json!({ "renderId": sent.render_id.as_str() })),
            &sent,
        )
        .unwrap();
        assert_eq!(result.lines_added, 0);
        assert_eq!(result.lines_removed, 0);
        assert_eq!(result.applied_options, sent.options);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_partial_applied_options_overlay_sent() {
        let sent = request();
        let result = validate(
            response(json!({
                "renderId": sent.render_id.as_str(),
                "appliedOptions": { "outputFormat": "line-by-line" },
            })),
            &sent,
        )
        .unwrap();
        assert_eq!(result.applied_options.output_format, OutputFormat::LineByLine);
        assert_eq!(result.applied_options.context, 1);
    }

    #[test]
    fn test_malformed_applied_options_fall_back() {
        let sent = request();
        let result = validate(
            response(json!({
                "renderId": sent.render_id.as_str(),
                "appliedOptions": { "context": "many" },
            })),
            &sent,
        )
        .unwrap();
        assert_eq!(result.applied_options, sent.options);
    }

    #[test]
    fn test_negative_counts_clamped() {
        let sent = request();
        let result = validate(
            response(json!({
                "renderId": sent.render_id.as_str(),
                "linesAdded": -4,
                "linesRemoved": 2,
            })),
            &sent,
        )
        .unwrap();
        assert_eq!(result.lines_added, 0);
        assert_eq!(result.lines_removed, 2);
    }

    #[test]
    fn test_error_forces_zero_counts() {
        let sent = request();
        let result = validate(
            response(json!({
                "renderId": sent.render_id.as_str(),
                "linesAdded": 3,
                "linesRemoved": 3,
                "error": "invalid regex",
            })),
            &sent,
        )
        .unwrap();
        assert_eq!(result.total_changes(), 0);
        assert_eq!(result.error.as_deref(), Some("invalid regex"));
        assert!(!result.is_ok());
    }

    #[test]
    fn test_mismatched_or_missing_render_id_rejected() {
        let sent = request();
        assert!(matches!(
            validate(response(json!({ "renderId": "stale" })), &sent),
            Err(ResultError::UnknownRenderId { found: Some(_), .. })
        ));
        assert!(matches!(
            validate(response(json!({ "linesAdded": 1 })), &sent),
            Err(ResultError::UnknownRenderId { found: None, .. })
        ));
    }

    #[test]
    fn test_non_object_response_is_malformed() {
        assert!(matches!(
            ViewResponse::from_value(json!("done")),
            Err(ResultError::Malformed(_))
        ));
    }

    #[test]
    fn test_badly_typed_fields_are_read_leniently() {
        let parsed = response(json!({
            "renderId": "r1",
            "linesAdded": 2.0,
            "linesRemoved": "three",
            "error": { "code": 7 },
        }));
        assert_eq!(parsed.render_id, Some(RenderId::new("r1")));
        assert_eq!(parsed.lines_added, Some(2));
        assert_eq!(parsed.lines_removed, None);
        assert_eq!(parsed.error.as_deref(), Some(r#"{"code":7}"#));

        let parsed = response(json!({ "renderId": 42, "linesAdded": "4" }));
        assert_eq!(parsed.render_id, None);
        assert_eq!(parsed.lines_added, Some(4));
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let sent = request();
        let result = validate(
            response(json!({ "renderId": sent.render_id.as_str(), "linesAdded": 1 })),
            &sent,
        )
        .unwrap();
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["linesAdded"], 1);
        assert_eq!(value["appliedOptions"]["context"], 1);
        assert!(value.get("error").is_none());
    }
}
