/// Logging setup: rolling text and JSON files plus terminal output.
///
/// Two files are written under the log directory and rotated daily:
/// - `crawler.log` - human-readable, no ANSI colors
/// - `crawler.json.log` - one JSON object per event, with span context
///
/// `RUST_LOG` controls filtering (default `info`), e.g.
/// `RUST_LOG=catalog_crawler=debug,reqwest=warn`.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const TEXT_LOG_PREFIX: &str = "crawler.log";
pub const JSON_LOG_PREFIX: &str = "crawler.json.log";

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("cannot create log directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("logging already initialized: {0}")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

/// Keeps the background log writers alive. Dropping it flushes pending lines.
#[must_use = "logs stop being written when the guard is dropped"]
pub struct LogGuard {
    _text: WorkerGuard,
    _json: WorkerGuard,
}

fn env_filter() -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new("info")?),
    }
}

/// Install the global subscriber writing to `log_dir` and stdout.
pub fn init_logging<P: AsRef<Path>>(log_dir: P) -> Result<LogGuard, LoggingError> {
    let log_path = log_dir.as_ref();
    std::fs::create_dir_all(log_path)?;

    let filter = env_filter()?;

    let (text_writer, text_guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(log_path, TEXT_LOG_PREFIX));
    let (json_writer, json_guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(log_path, JSON_LOG_PREFIX));

    let text_layer = fmt::layer()
        .with_writer(text_writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_ansi(false)
        .compact()
        .with_filter(filter.clone());

    let json_layer = fmt::layer()
        .json()
        .with_writer(json_writer)
        .with_target(true)
        .with_line_number(true)
        .with_current_span(true)
        .with_span_list(true)
        .with_filter(filter.clone());

    let stdout_layer = fmt::layer()
        .with_target(false)
        .compact()
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(text_layer)
        .with(json_layer)
        .with(stdout_layer)
        .try_init()?;

    tracing::debug!(dir = %log_path.display(), "logging initialized");

    Ok(LogGuard {
        _text: text_guard,
        _json: json_guard,
    })
}
