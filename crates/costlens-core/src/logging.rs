//! Logging setup for costlens.
//!
//! Every run writes JSON lines to a daily-rolling file under the data
//! directory, with a compact human-readable copy on stderr. Filtering goes
//! through `EnvFilter`, so `RUST_LOG` overrides the defaults at any time.
//!
//! ```no_run
//! use costlens_core::logging;
//!
//! let _guard = logging::init_logging(None, false).expect("install subscriber");
//!
//! tracing::info!("costlens started");
//! tracing::debug!(service = "EC2", "aggregating records");
//! ```

use std::path::{Path, PathBuf};

use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

use crate::error::{CoreError, Result};

/// Name of the rolling log file inside the log directory.
const LOG_FILE_NAME: &str = "costlens.log";

/// Holds the file appender worker for the process lifetime.
///
/// Dropping the guard flushes buffered log lines, so keep it alive until
/// shutdown.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Set up file and console logging.
///
/// The file side writes JSON lines to `<log_dir>/costlens.log` with daily
/// rotation; the console side writes a compact rendering to stderr. When
/// `log_dir` is `None` the directory defaults to `~/.costlens/logs/`.
/// `verbose` raises the default level from `info` to `debug` and adds
/// file/line locations to console output. Returns the [`LogGuard`] the
/// caller must hold until exit.
pub fn init_logging(log_dir: Option<PathBuf>, verbose: bool) -> Result<LogGuard> {
    let log_dir = match log_dir {
        Some(dir) => dir,
        None => default_log_dir()?,
    };
    std::fs::create_dir_all(&log_dir).map_err(|e| CoreError::DirectoryCreation {
        path: log_dir.clone(),
        source: e,
    })?;

    let (writer, file_guard) = file_writer(&log_dir);

    tracing_subscriber::registry()
        .with(level_filter(verbose))
        .with(file_layer(writer))
        .with(console_layer(verbose))
        .init();

    tracing::debug!(log_dir = %log_dir.display(), verbose, "logging ready");

    Ok(LogGuard {
        _file_guard: Some(file_guard),
    })
}

/// Console-only logging for tests. Safe to call more than once; later
/// calls are ignored.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Directory log files land in: `~/.costlens/logs/`.
pub fn default_log_dir() -> Result<PathBuf> {
    Ok(crate::config::default_data_dir()?.join("logs"))
}

/// Path of the current log file: `~/.costlens/logs/costlens.log`.
pub fn default_log_file() -> Result<PathBuf> {
    Ok(default_log_dir()?.join(LOG_FILE_NAME))
}

/// `RUST_LOG` when set, otherwise `costlens=info` (`debug` with -v).
fn level_filter(verbose: bool) -> EnvFilter {
    let default_level = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("costlens={default_level}")))
}

/// Non-blocking daily-rolling writer for the JSON log file.
fn file_writer(log_dir: &Path) -> (NonBlocking, WorkerGuard) {
    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    tracing_appender::non_blocking(appender)
}

/// JSON-lines layer for the log file. Span close events record how long
/// each report or generation cycle ran.
fn file_layer<S>(writer: NonBlocking) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .json()
        .with_span_events(FmtSpan::CLOSE)
        .with_current_span(true)
        .with_span_list(true)
}

/// Compact stderr layer. Source locations appear only in verbose mode.
fn console_layer<S>(verbose: bool) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(verbose)
        .with_line_number(verbose)
        .compact()
}
