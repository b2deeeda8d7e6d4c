//! Logging backend for the `code-diff` binary.
//!
//! Routes every `log::` macro call to stderr. Stdout stays reserved for
//! command output and, under `serve`, for the view protocol itself.
//!
//! Level resolution: the `--log-level` flag, then the `CODE_DIFF_LOG`
//! environment variable, then `warn`.

use std::io::Write;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;

/// Environment variable consulted when no level is passed explicitly.
pub const LOG_LEVEL_ENV: &str = "CODE_DIFF_LOG";

struct DebugLogger {
    level: LevelFilter,
    // Serializes writes so lines from concurrent tasks never interleave.
    sink: Mutex<Box<dyn Write + Send>>,
}

impl Log for DebugLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(record);
        let mut sink = self.sink.lock();
        let _ = sink.write_all(line.as_bytes());
        let _ = sink.flush();
    }

    fn flush(&self) {
        let _ = self.sink.lock().flush();
    }
}

static LOGGER: OnceLock<DebugLogger> = OnceLock::new();

fn format_line(record: &Record) -> String {
    format!(
        "[{}] [{:<5}] [{}] {}\n",
        get_timestamp(),
        record.level(),
        record.target(),
        record.args()
    )
}

fn get_timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

/// Resolve the effective level from an explicit setting or the environment.
///
/// Unparseable values fall back to `warn`.
pub fn resolve_level(explicit: Option<&str>) -> LevelFilter {
    let from_env = std::env::var(LOG_LEVEL_ENV).ok();
    explicit
        .or(from_env.as_deref())
        .and_then(|raw| LevelFilter::from_str(raw.trim()).ok())
        .unwrap_or(LevelFilter::Warn)
}

/// Install the stderr logger. Later calls keep the first installation.
pub fn init(explicit: Option<&str>) {
    let level = resolve_level(explicit);
    let logger = LOGGER.get_or_init(|| DebugLogger {
        level,
        sink: Mutex::new(Box::new(std::io::stderr())),
    });
    if log::set_logger(logger).is_ok() {
        log::set_max_level(logger.level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_level_wins() {
        assert_eq!(resolve_level(Some("debug")), LevelFilter::Debug);
        assert_eq!(resolve_level(Some("TRACE")), LevelFilter::Trace);
        assert_eq!(resolve_level(Some("off")), LevelFilter::Off);
    }

    #[test]
    fn test_unparseable_level_falls_back_to_warn() {
        assert_eq!(resolve_level(Some("chatty")), LevelFilter::Warn);
    }

    #[test]
    fn test_line_format() {
        let line = format_line(
            &Record::builder()
                .level(log::Level::Info)
                .target("code_diff_bridge::channel")
                .args(format_args!("Channel ready"))
                .build(),
        );
        assert!(line.ends_with("[INFO ] [code_diff_bridge::channel] Channel ready\n"));
    }
}
