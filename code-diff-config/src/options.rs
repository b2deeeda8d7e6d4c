//! Diff options model.
//!
//! [`DiffOptions`] is always fully populated: every enum and boolean has a
//! fixed default, `context` is clamped into `[0, u32::MAX]`, and the optional
//! string options pass through as opaque values. Raw host input arrives as an
//! [`OptionsMap`] and is normalized with [`DiffOptions::from_map`] or layered
//! over existing options with [`DiffOptions::overlay`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Raw, unvalidated options as supplied by the host (camelCase keys).
pub type OptionsMap = Map<String, Value>;

// ============================================================================
// Enumerated options
// ============================================================================

/// Layout of the rendered diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Old and new text in two panes
    #[default]
    SideBySide,
    /// Unified single-pane layout
    LineByLine,
}

impl OutputFormat {
    /// Wire identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::SideBySide => "side-by-side",
            OutputFormat::LineByLine => "line-by-line",
        }
    }

    /// All formats for UI iteration
    pub fn all() -> &'static [OutputFormat] {
        &[OutputFormat::SideBySide, OutputFormat::LineByLine]
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "side-by-side" => Ok(OutputFormat::SideBySide),
            "line-by-line" => Ok(OutputFormat::LineByLine),
            _ => Err(format!(
                "expected one of \"side-by-side\", \"line-by-line\", got \"{s}\""
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Granularity of intra-line highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiffStyle {
    #[default]
    Word,
    Char,
}

impl DiffStyle {
    /// Wire identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffStyle::Word => "word",
            DiffStyle::Char => "char",
        }
    }

    /// All styles for UI iteration
    pub fn all() -> &'static [DiffStyle] {
        &[DiffStyle::Word, DiffStyle::Char]
    }
}

impl FromStr for DiffStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "word" => Ok(DiffStyle::Word),
            "char" | "character" => Ok(DiffStyle::Char),
            _ => Err(format!("expected one of \"word\", \"char\", got \"{s}\"")),
        }
    }
}

impl fmt::Display for DiffStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize_token(s: &str) -> String {
    s.trim().to_ascii_lowercase().replace('_', "-")
}

// ============================================================================
// Option keys
// ============================================================================

/// Every recognized option, with its canonical wire name and accepted aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKey {
    OutputFormat,
    DiffStyle,
    Context,
    TrimWhitespace,
    IgnoreLineEndings,
    Height,
    ForceInlineComparison,
    HideHeader,
    HideStat,
    IgnoreMatchingLines,
    Filename,
}

impl OptionKey {
    /// Canonical camelCase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKey::OutputFormat => "outputFormat",
            OptionKey::DiffStyle => "diffStyle",
            OptionKey::Context => "context",
            OptionKey::TrimWhitespace => "trimWhitespace",
            OptionKey::IgnoreLineEndings => "ignoreLineEndings",
            OptionKey::Height => "height",
            OptionKey::ForceInlineComparison => "forceInlineComparison",
            OptionKey::HideHeader => "hideHeader",
            OptionKey::HideStat => "hideStat",
            OptionKey::IgnoreMatchingLines => "ignoreMatchingLines",
            OptionKey::Filename => "filename",
        }
    }

    /// Map a raw key (canonical name or alias) to an option.
    ///
    /// Aliases cover the snake_case keyword names and the `trim` /
    /// `noDiffLineFeed` spellings used by older host APIs.
    pub fn resolve(key: &str) -> Option<OptionKey> {
        let key = match key {
            "outputFormat" | "output_format" => OptionKey::OutputFormat,
            "diffStyle" | "diff_style" => OptionKey::DiffStyle,
            "context" => OptionKey::Context,
            "trimWhitespace" | "trim_whitespace" | "trim" => OptionKey::TrimWhitespace,
            "ignoreLineEndings" | "ignore_line_endings" | "noDiffLineFeed"
            | "no_diff_line_feed" => OptionKey::IgnoreLineEndings,
            "height" => OptionKey::Height,
            "forceInlineComparison" | "force_inline_comparison" => {
                OptionKey::ForceInlineComparison
            }
            "hideHeader" | "hide_header" => OptionKey::HideHeader,
            "hideStat" | "hide_stat" => OptionKey::HideStat,
            "ignoreMatchingLines" | "ignore_matching_lines" => OptionKey::IgnoreMatchingLines,
            "filename" | "file_name" | "fileName" => OptionKey::Filename,
            _ => return None,
        };
        Some(key)
    }
}

// ============================================================================
// DiffOptions
// ============================================================================

/// Fully-populated diff options, ready for serialization.
///
/// Deserializing goes through [`DiffOptions::from_value`], so serde input is
/// normalized exactly like a host options map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffOptions {
    pub output_format: OutputFormat,
    pub diff_style: DiffStyle,
    /// Unchanged lines shown around each change. `0` is valid.
    pub context: u32,
    pub trim_whitespace: bool,
    pub ignore_line_endings: bool,
    /// CSS size string; `None` auto-sizes.
    pub height: Option<String>,
    pub force_inline_comparison: bool,
    pub hide_header: bool,
    pub hide_stat: bool,
    /// Regex for lines excluded from the diff. Not validated here.
    pub ignore_matching_lines: Option<String>,
    /// Display label only.
    pub filename: Option<String>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            output_format: crate::defaults::output_format(),
            diff_style: crate::defaults::diff_style(),
            context: crate::defaults::context(),
            trim_whitespace: false,
            ignore_line_endings: false,
            height: None,
            force_inline_comparison: false,
            hide_header: false,
            hide_stat: false,
            ignore_matching_lines: None,
            filename: None,
        }
    }
}

impl<'de> Deserialize<'de> for DiffOptions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        DiffOptions::from_value(&value).map_err(serde::de::Error::custom)
    }
}

impl DiffOptions {
    /// Normalize a raw options map on top of the defaults.
    pub fn from_map(map: &OptionsMap) -> Result<Self, ConfigError> {
        Self::default().overlay(map)
    }

    /// Normalize an arbitrary JSON value, which must be an object (or null).
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        match value {
            Value::Object(map) => Self::from_map(map),
            Value::Null => Ok(Self::default()),
            other => Err(ConfigError::NotAnObject(json_kind(other).to_string())),
        }
    }

    /// Apply a raw options map on top of `self`.
    ///
    /// Keys may use canonical names or aliases. `null` and empty strings mean
    /// "not provided" and keep the base value. Unknown keys are ignored.
    pub fn overlay(&self, map: &OptionsMap) -> Result<Self, ConfigError> {
        let mut out = self.clone();
        for (raw_key, value) in map {
            let Some(key) = OptionKey::resolve(raw_key) else {
                log::warn!("Ignoring unknown diff option '{raw_key}'");
                continue;
            };
            if value.is_null() {
                continue;
            }
            let name = key.as_str();
            match key {
                OptionKey::OutputFormat => {
                    out.output_format = parse_enum(name, value)?;
                }
                OptionKey::DiffStyle => {
                    out.diff_style = parse_enum(name, value)?;
                }
                OptionKey::Context => {
                    out.context = parse_context(value)?;
                }
                OptionKey::TrimWhitespace => out.trim_whitespace = parse_bool(name, value)?,
                OptionKey::IgnoreLineEndings => out.ignore_line_endings = parse_bool(name, value)?,
                OptionKey::ForceInlineComparison => {
                    out.force_inline_comparison = parse_bool(name, value)?
                }
                OptionKey::HideHeader => out.hide_header = parse_bool(name, value)?,
                OptionKey::HideStat => out.hide_stat = parse_bool(name, value)?,
                OptionKey::Height => {
                    if let Some(height) = parse_height(value)? {
                        out.height = Some(height);
                    }
                }
                OptionKey::IgnoreMatchingLines => {
                    if let Some(pattern) = parse_opt_string(name, value)? {
                        out.ignore_matching_lines = Some(pattern);
                    }
                }
                OptionKey::Filename => {
                    if let Some(filename) = parse_opt_string(name, value)? {
                        out.filename = Some(filename);
                    }
                }
            }
        }
        Ok(out)
    }

    /// The fully-populated camelCase map (absent strings become `null`).
    pub fn to_map(&self) -> OptionsMap {
        let opt = |v: &Option<String>| v.clone().map(Value::String).unwrap_or(Value::Null);
        let mut map = Map::new();
        map.insert(
            OptionKey::OutputFormat.as_str().into(),
            self.output_format.as_str().into(),
        );
        map.insert(
            OptionKey::DiffStyle.as_str().into(),
            self.diff_style.as_str().into(),
        );
        map.insert(OptionKey::Context.as_str().into(), self.context.into());
        map.insert(
            OptionKey::TrimWhitespace.as_str().into(),
            self.trim_whitespace.into(),
        );
        map.insert(
            OptionKey::IgnoreLineEndings.as_str().into(),
            self.ignore_line_endings.into(),
        );
        map.insert(OptionKey::Height.as_str().into(), opt(&self.height));
        map.insert(
            OptionKey::ForceInlineComparison.as_str().into(),
            self.force_inline_comparison.into(),
        );
        map.insert(OptionKey::HideHeader.as_str().into(), self.hide_header.into());
        map.insert(OptionKey::HideStat.as_str().into(), self.hide_stat.into());
        map.insert(
            OptionKey::IgnoreMatchingLines.as_str().into(),
            opt(&self.ignore_matching_lines),
        );
        map.insert(OptionKey::Filename.as_str().into(), opt(&self.filename));
        map
    }

    /// Whether the view renders a single pane.
    pub fn is_inline(&self) -> bool {
        self.output_format == OutputFormat::LineByLine || self.force_inline_comparison
    }
}

// ============================================================================
// Value parsing
// ============================================================================

/// Clamp a raw context value into the valid range.
pub fn clamp_context(raw: i64) -> u32 {
    if raw < 0 {
        0
    } else {
        u32::try_from(raw).unwrap_or(u32::MAX)
    }
}

fn parse_context(value: &Value) -> Result<u32, ConfigError> {
    let key = OptionKey::Context.as_str();
    let raw = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i
            } else if n.as_u64().is_some() {
                i64::MAX
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 => {
                        f.clamp(i64::MIN as f64, i64::MAX as f64) as i64
                    }
                    _ => {
                        return Err(ConfigError::invalid(
                            key,
                            format!("expected an integer, got {n}"),
                        ));
                    }
                }
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| ConfigError::invalid(key, format!("expected an integer, got \"{s}\"")))?,
        other => {
            return Err(ConfigError::invalid(
                key,
                format!("expected an integer, got {}", json_kind(other)),
            ));
        }
    };
    let context = clamp_context(raw);
    if raw < 0 {
        log::debug!("Clamped diff context {raw} to {context}");
    }
    Ok(context)
}

fn parse_bool(key: &str, value: &Value) -> Result<bool, ConfigError> {
    value.as_bool().ok_or_else(|| {
        ConfigError::invalid(
            key,
            format!("expected a boolean, got {}", json_kind(value)),
        )
    })
}

fn parse_enum<T>(key: &str, value: &Value) -> Result<T, ConfigError>
where
    T: FromStr<Err = String>,
{
    match value {
        Value::String(s) => s.parse().map_err(|reason| ConfigError::invalid(key, reason)),
        other => Err(ConfigError::invalid(
            key,
            format!("expected a string, got {}", json_kind(other)),
        )),
    }
}

fn parse_opt_string(key: &str, value: &Value) -> Result<Option<String>, ConfigError> {
    match value {
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(ConfigError::invalid(
            key,
            format!("expected a string, got {}", json_kind(other)),
        )),
    }
}

/// Heights may be CSS strings or bare pixel counts.
fn parse_height(value: &Value) -> Result<Option<String>, ConfigError> {
    match value {
        Value::Number(n) if n.as_u64().is_some() => Ok(Some(format!("{n}px"))),
        other => parse_opt_string(OptionKey::Height.as_str(), other),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> OptionsMap {
        match value {
            Value::Object(m) => m,
            _ => panic!("test helper expects an object"),
        }
    }

    #[test]
    fn test_empty_map_yields_defaults() {
        let opts = DiffOptions::from_map(&OptionsMap::new()).unwrap();
        assert_eq!(opts, DiffOptions::default());
        assert_eq!(opts.output_format, OutputFormat::SideBySide);
        assert_eq!(opts.diff_style, DiffStyle::Word);
        assert_eq!(opts.context, 5);
        assert!(opts.height.is_none());
    }

    #[test]
    fn test_negative_context_is_clamped() {
        let opts = DiffOptions::from_map(&map(json!({ "context": -5 }))).unwrap();
        assert_eq!(opts.context, 0);
    }

    #[test]
    fn test_zero_context_is_valid() {
        let opts = DiffOptions::from_map(&map(json!({ "context": 0 }))).unwrap();
        assert_eq!(opts.context, 0);
    }

    #[test]
    fn test_context_accepts_integral_float_and_numeric_string() {
        let opts = DiffOptions::from_map(&map(json!({ "context": 3.0 }))).unwrap();
        assert_eq!(opts.context, 3);
        let opts = DiffOptions::from_map(&map(json!({ "context": " 7 " }))).unwrap();
        assert_eq!(opts.context, 7);
    }

    #[test]
    fn test_context_rejects_fraction_and_garbage() {
        let err = DiffOptions::from_map(&map(json!({ "context": 1.5 }))).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOption { ref key, .. } if key == "context"));
        assert!(DiffOptions::from_map(&map(json!({ "context": "lots" }))).is_err());
        assert!(DiffOptions::from_map(&map(json!({ "context": [1] }))).is_err());
    }

    #[test]
    fn test_huge_context_saturates() {
        let opts = DiffOptions::from_map(&map(json!({ "context": u64::MAX }))).unwrap();
        assert_eq!(opts.context, u32::MAX);
    }

    #[test]
    fn test_enum_values_parse() {
        let opts = DiffOptions::from_map(&map(json!({
            "outputFormat": "line-by-line",
            "diffStyle": "char",
        })))
        .unwrap();
        assert_eq!(opts.output_format, OutputFormat::LineByLine);
        assert_eq!(opts.diff_style, DiffStyle::Char);
        assert!(opts.is_inline());
    }

    #[test]
    fn test_enum_parse_is_lenient_on_case_and_underscores() {
        assert_eq!("Line_By_Line".parse::<OutputFormat>(), Ok(OutputFormat::LineByLine));
        assert_eq!("CHAR".parse::<DiffStyle>(), Ok(DiffStyle::Char));
    }

    #[test]
    fn test_unknown_enum_value_is_config_error() {
        let err = DiffOptions::from_map(&map(json!({ "outputFormat": "diagonal" }))).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("outputFormat"));
        assert!(msg.contains("diagonal"));
    }

    #[test]
    fn test_wrong_type_for_bool_is_config_error() {
        let err = DiffOptions::from_map(&map(json!({ "hideStat": "yes" }))).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOption { ref key, .. } if key == "hideStat"));
    }

    #[test]
    fn test_aliases_are_accepted() {
        let opts = DiffOptions::from_map(&map(json!({
            "output_format": "line-by-line",
            "trim": true,
            "no_diff_line_feed": true,
            "force_inline_comparison": true,
            "ignore_matching_lines": "^#",
        })))
        .unwrap();
        assert_eq!(opts.output_format, OutputFormat::LineByLine);
        assert!(opts.trim_whitespace);
        assert!(opts.ignore_line_endings);
        assert!(opts.force_inline_comparison);
        assert_eq!(opts.ignore_matching_lines.as_deref(), Some("^#"));
    }

    #[test]
    fn test_null_and_empty_strings_mean_absent() {
        let opts = DiffOptions::from_map(&map(json!({
            "height": null,
            "filename": "",
            "ignoreMatchingLines": "",
            "hideHeader": null,
        })))
        .unwrap();
        assert_eq!(opts, DiffOptions::default());
    }

    #[test]
    fn test_invalid_regex_passes_through_unchecked() {
        let opts = DiffOptions::from_map(&map(json!({ "ignoreMatchingLines": "([" }))).unwrap();
        assert_eq!(opts.ignore_matching_lines.as_deref(), Some("(["));
    }

    #[test]
    fn test_numeric_height_becomes_pixels() {
        let opts = DiffOptions::from_map(&map(json!({ "height": 400 }))).unwrap();
        assert_eq!(opts.height.as_deref(), Some("400px"));
        let opts = DiffOptions::from_map(&map(json!({ "height": "50vh" }))).unwrap();
        assert_eq!(opts.height.as_deref(), Some("50vh"));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let opts = DiffOptions::from_map(&map(json!({ "theme": "dark" }))).unwrap();
        assert_eq!(opts, DiffOptions::default());
    }

    #[test]
    fn test_overlay_keeps_base_for_missing_fields() {
        let base = DiffOptions {
            context: 2,
            height: Some("300px".to_string()),
            ..DiffOptions::default()
        };
        let opts = base.overlay(&map(json!({ "hideStat": true }))).unwrap();
        assert_eq!(opts.context, 2);
        assert_eq!(opts.height.as_deref(), Some("300px"));
        assert!(opts.hide_stat);
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert!(matches!(
            DiffOptions::from_value(&json!([1, 2])),
            Err(ConfigError::NotAnObject(_))
        ));
        assert_eq!(
            DiffOptions::from_value(&Value::Null).unwrap(),
            DiffOptions::default()
        );
    }

    #[test]
    fn test_to_map_is_fully_populated() {
        let m = DiffOptions::default().to_map();
        assert_eq!(m.len(), 11);
        assert_eq!(m["outputFormat"], "side-by-side");
        assert_eq!(m["height"], Value::Null);
        assert_eq!(DiffOptions::from_map(&m).unwrap(), DiffOptions::default());
    }

    #[test]
    fn test_serde_matches_wire_names_and_clamps() {
        let json = serde_json::to_value(DiffOptions::default()).unwrap();
        assert_eq!(json["outputFormat"], "side-by-side");
        assert_eq!(json["ignoreLineEndings"], false);

        let opts: DiffOptions = serde_json::from_value(json!({ "context": -3 })).unwrap();
        assert_eq!(opts.context, 0);
        assert_eq!(opts.diff_style, DiffStyle::Word);
    }

    #[test]
    fn test_deserialize_normalizes_like_overlay() {
        let cases = [
            (json!({ "context": 3.0 }), 3),
            (json!({ "context": "7" }), 7),
            (json!({ "context": null }), 5),
            (json!({ "context": u64::MAX }), u32::MAX),
        ];
        for (input, expected) in cases {
            let opts: DiffOptions = serde_json::from_value(input.clone()).unwrap();
            assert_eq!(opts.context, expected, "input {input}");
            assert_eq!(opts, DiffOptions::from_value(&input).unwrap());
        }

        let aliased: DiffOptions = serde_json::from_value(json!({ "trim": true })).unwrap();
        assert!(aliased.trim_whitespace);
        assert!(serde_json::from_value::<DiffOptions>(json!({ "context": 1.5 })).is_err());
        assert!(serde_json::from_value::<DiffOptions>(json!([1])).is_err());
    }
}
