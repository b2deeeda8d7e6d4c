//! Command-line interface for code-diff.
//!
//! `render` diffs two files through a view and prints the result as JSON;
//! `serve` runs the reference engine as a stdio view for another host.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use code_diff_config::{OptionKey, OptionsMap, ViewerConfig};
use serde_json::Value;

use crate::engine::LineDiffEngine;
use crate::viewer::DiffViewer;

/// Exit code when the exchange with the view failed.
pub const EXIT_CHANNEL_FAILURE: i32 = 1;
/// Exit code when the view reported a render error.
pub const EXIT_RENDER_ERROR: i32 = 2;

/// code-diff - render code diffs through an embeddable diff view
#[derive(Parser, Debug)]
#[command(name = "code-diff")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (off, error, warn, info, debug, trace). Overrides CODE_DIFF_LOG
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Diff two files and print the result as JSON
    Render(RenderArgs),
    /// Run the reference view on stdin/stdout (JSON lines)
    Serve,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Original file
    pub old: PathBuf,
    /// Modified file
    pub new: PathBuf,

    /// Language of both files (unknown names fall back to plaintext)
    #[arg(short, long)]
    pub language: Option<String>,

    /// side-by-side or line-by-line
    #[arg(long, value_name = "FORMAT")]
    pub output_format: Option<String>,

    /// word or char
    #[arg(long, value_name = "STYLE")]
    pub diff_style: Option<String>,

    /// Unchanged lines around each change (negative values clamp to 0)
    #[arg(short = 'c', long, allow_negative_numbers = true)]
    pub context: Option<i64>,

    /// Ignore leading and trailing whitespace
    #[arg(long)]
    pub trim: bool,

    /// Treat CRLF and LF as equal
    #[arg(long)]
    pub ignore_line_endings: bool,

    /// Drop lines matching this regex before diffing
    #[arg(long, value_name = "REGEX")]
    pub ignore_matching_lines: Option<String>,

    /// Label shown in the view header
    #[arg(long)]
    pub filename: Option<String>,

    /// Render a single pane even in side-by-side mode
    #[arg(long)]
    pub force_inline: bool,

    #[arg(long)]
    pub hide_header: bool,

    #[arg(long)]
    pub hide_stat: bool,

    /// Viewer config file (YAML or TOML). Defaults to the platform config dir
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Run the view as this subprocess instead of in-process
    #[arg(long, value_name = "COMMAND")]
    pub view_command: Option<String>,
}

impl RenderArgs {
    /// The options map for the flags that were actually given.
    ///
    /// Flags left unset are omitted so configured defaults still apply.
    pub fn options_map(&self) -> OptionsMap {
        let mut map = OptionsMap::new();
        let mut put = |key: OptionKey, value: Value| {
            map.insert(key.as_str().to_string(), value);
        };
        if let Some(format) = &self.output_format {
            put(OptionKey::OutputFormat, format.as_str().into());
        }
        if let Some(style) = &self.diff_style {
            put(OptionKey::DiffStyle, style.as_str().into());
        }
        if let Some(context) = self.context {
            put(OptionKey::Context, context.into());
        }
        if let Some(pattern) = &self.ignore_matching_lines {
            put(OptionKey::IgnoreMatchingLines, pattern.as_str().into());
        }
        if let Some(filename) = &self.filename {
            put(OptionKey::Filename, filename.as_str().into());
        }
        for (set, key) in [
            (self.trim, OptionKey::TrimWhitespace),
            (self.ignore_line_endings, OptionKey::IgnoreLineEndings),
            (self.force_inline, OptionKey::ForceInlineComparison),
            (self.hide_header, OptionKey::HideHeader),
            (self.hide_stat, OptionKey::HideStat),
        ] {
            if set {
                put(key, Value::Bool(true));
            }
        }
        map
    }

    fn load_config(&self) -> Result<ViewerConfig> {
        let mut config = match &self.config {
            Some(path) => ViewerConfig::load_from(path)?,
            None => ViewerConfig::load()?,
        };
        if let Some(command) = &self.view_command {
            config.view_command = Some(command.clone());
        }
        Ok(config)
    }
}

/// Run `render` and return the process exit code.
pub async fn run_render(args: &RenderArgs) -> Result<i32> {
    let old_text = read_text(&args.old)?;
    let new_text = read_text(&args.new)?;
    let config = args.load_config()?;

    let viewer = DiffViewer::from_config(&config)?;
    let outcome = viewer
        .render(
            &old_text,
            &new_text,
            &args.options_map(),
            args.language.as_deref(),
        )
        .await;
    viewer.teardown().await;

    match outcome {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            if let Some(error) = &result.error {
                eprintln!("code-diff: render error: {error}");
                Ok(EXIT_RENDER_ERROR)
            } else {
                Ok(0)
            }
        }
        Err(e) => {
            eprintln!("code-diff: error: {e}");
            Ok(EXIT_CHANNEL_FAILURE)
        }
    }
}

/// Run `serve` until stdin closes.
pub async fn run_serve() -> Result<()> {
    log::info!("Serving reference view on stdio");
    code_diff_bridge::serve_stdio(
        LineDiffEngine::new(),
        tokio::io::stdin(),
        tokio::io::stdout(),
    )
    .await?;
    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_render_flags_map_to_options() {
        let cli = Cli::try_parse_from([
            "code-diff",
            "render",
            "a.py",
            "b.py",
            "--output-format",
            "line-by-line",
            "--context",
            "-5",
            "--trim",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        let Commands::Render(args) = cli.command else {
            panic!("Expected render subcommand");
        };
        let map = args.options_map();
        assert_eq!(map["outputFormat"], "line-by-line");
        assert_eq!(map["context"], -5);
        assert_eq!(map["trimWhitespace"], true);
        assert!(!map.contains_key("diffStyle"));
        assert!(!map.contains_key("hideStat"));
    }

    #[test]
    fn test_serve_subcommand() {
        let cli = Cli::try_parse_from(["code-diff", "serve"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve));
    }
}
