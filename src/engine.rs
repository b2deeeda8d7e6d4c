//! Reference render engine.
//!
//! Counts changed lines with `similar` after applying the normalization
//! options (`ignoreLineEndings`, `trimWhitespace`, `ignoreMatchingLines`).
//! Display-only options (output format, diff style, context, header/stat
//! visibility) do not change the counts and are echoed back as applied.

use code_diff_bridge::{RenderEngine, ViewResponse, WireRequest};
use code_diff_config::DiffOptions;
use regex::Regex;
use similar::{ChangeTag, TextDiff};

/// Line-based diff engine used by `code-diff serve` and in-process views.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineDiffEngine;

impl LineDiffEngine {
    pub fn new() -> Self {
        Self
    }

    /// Count `(added, removed)` lines between two texts under `options`.
    ///
    /// Fails only when `ignoreMatchingLines` is not a valid regex.
    pub fn count(
        &self,
        old_text: &str,
        new_text: &str,
        options: &DiffOptions,
    ) -> Result<(u64, u64), regex::Error> {
        let ignore = options
            .ignore_matching_lines
            .as_deref()
            .map(Regex::new)
            .transpose()?;

        let old = normalize(old_text, options, ignore.as_ref());
        let new = normalize(new_text, options, ignore.as_ref());

        let diff = TextDiff::from_lines(&old, &new);
        let mut added = 0u64;
        let mut removed = 0u64;
        for change in diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Insert => added += 1,
                ChangeTag::Delete => removed += 1,
                ChangeTag::Equal => {}
            }
        }
        Ok((added, removed))
    }
}

impl RenderEngine for LineDiffEngine {
    fn render(&self, request: &WireRequest) -> ViewResponse {
        match self.count(&request.old_text, &request.new_text, &request.options) {
            Ok((added, removed)) => {
                log::debug!(
                    "Render {}: +{added} -{removed}",
                    request.render_id.short()
                );
                ViewResponse::rendered(request, added, removed)
            }
            Err(e) => {
                log::warn!(
                    "Render {}: invalid ignoreMatchingLines pattern: {e}",
                    request.render_id.short()
                );
                ViewResponse::failed(request, format!("invalid ignoreMatchingLines pattern: {e}"))
            }
        }
    }
}

fn normalize(text: &str, options: &DiffOptions, ignore: Option<&Regex>) -> String {
    let text = if options.ignore_line_endings {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text.to_string()
    };
    if !options.trim_whitespace && ignore.is_none() {
        return text;
    }

    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let (body, ending) = match line.strip_suffix('\n') {
            Some(body) => (body, "\n"),
            None => (line, ""),
        };
        if ignore.is_some_and(|re| re.is_match(body)) {
            continue;
        }
        if options.trim_whitespace {
            out.push_str(body.trim());
        } else {
            out.push_str(body);
        }
        out.push_str(ending);
    }
    out
}
