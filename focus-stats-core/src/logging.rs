//! Logging infrastructure for focus-stats
//!
//! Logs are written to `~/.local/state/focus-stats/focus-stats.YYYY-MM-DD.log`
//! following XDG standards, one file per UTC day.

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use chrono::{NaiveDate, Utc};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const LOG_PREFIX: &str = "focus-stats";
const LOG_SUFFIX: &str = "log";

/// Initialize the logging system in the XDG state directory
///
/// Sets up tracing with:
/// - Daily rotated file output, keeping `max_files` files
/// - Level from config, overridable via RUST_LOG
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    init_in(&Config::state_dir(), config)
}

/// Initialize the logging system writing into `log_dir`
pub fn init_in(log_dir: &Path, config: &LoggingConfig) -> Result<LoggingGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix(LOG_SUFFIX)
        .max_log_files(config.max_files.max(1))
        .build(log_dir)
        .map_err(|e| Error::Config(format!("failed to create log appender: {}", e)))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("failed to install log subscriber: {}", e)))?;

    tracing::debug!(
        log_dir = %log_dir.display(),
        level = %config.level,
        "Logging initialized"
    );

    Ok(LoggingGuard { _guard: guard })
}

/// Initialize logging for tests (logs to the test writer)
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}

/// Guard that keeps the logging system alive
///
/// When dropped, flushes any pending log writes.
pub struct LoggingGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Returns the file today's log events go to
pub fn log_file_path() -> PathBuf {
    log_file_path_in(&Config::state_dir(), Utc::now().date_naive())
}

/// Daily log file for `date` under `log_dir`, as named by the rolling appender
pub fn log_file_path_in(log_dir: &Path, date: NaiveDate) -> PathBuf {
    log_dir.join(format!(
        "{LOG_PREFIX}.{}.{LOG_SUFFIX}",
        date.format("%Y-%m-%d")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_path_in() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 2).unwrap();
        let path = log_file_path_in(Path::new("/var/log/fs"), date);
        assert_eq!(path, PathBuf::from("/var/log/fs/focus-stats.2024-12-02.log"));
    }

    #[test]
    fn test_init_in_creates_daily_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = LoggingConfig::default();

        let guard = init_in(dir.path(), &config).unwrap();
        tracing::debug!("written by test");
        drop(guard);

        assert!(log_file_path_in(dir.path(), Utc::now().date_naive()).exists());
    }

    #[test]
    fn test_log_file_path_is_under_state_dir() {
        let path = log_file_path();
        assert!(path.starts_with(Config::state_dir()));
        assert!(path.extension().is_some_and(|ext| ext == "log"));
    }
}
