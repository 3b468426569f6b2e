//! Logging setup for binaries.
//!
//! The library itself only emits `tracing` events. Applications call
//! [`init_logging`] once at startup to print them to stderr and, optionally,
//! append them to a file.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Errors installing the global subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log level '{level}': {reason}")]
    Filter { level: String, reason: String },

    #[error("Log file path has no file name: {}", .0.display())]
    FilePath(PathBuf),

    #[error("Failed to install log subscriber: {0}")]
    Init(String),
}

/// Keeps the background log writer alive. Dropping it flushes pending lines.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug)]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `level`. Timestamps use the local offset
/// when it can be determined, UTC otherwise.
pub fn init_logging(level: &str, file: Option<&Path>) -> Result<LoggingGuard, LoggingError> {
    let filter = build_filter(level)?;

    let stderr_layer = match OffsetTime::local_rfc_3339() {
        Ok(timer) => fmt::layer()
            .with_writer(std::io::stderr)
            .with_timer(timer)
            .boxed(),
        Err(_) => fmt::layer().with_writer(std::io::stderr).boxed(),
    };

    let (file_layer, guard) = match file {
        Some(path) => {
            let (dir, name) = split_log_path(path)?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false).boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    tracing::debug!(level, file = ?file, "Logging initialized");
    Ok(LoggingGuard { _file: guard })
}

fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|e| LoggingError::Filter {
        level: level.to_string(),
        reason: e.to_string(),
    })
}

fn split_log_path(path: &Path) -> Result<(PathBuf, PathBuf), LoggingError> {
    let name = path
        .file_name()
        .ok_or_else(|| LoggingError::FilePath(path.to_path_buf()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, PathBuf::from(name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_log_path() {
        let (dir, name) = split_log_path(Path::new("/var/log/docpivot.log")).unwrap();
        assert_eq!(dir, PathBuf::from("/var/log"));
        assert_eq!(name, PathBuf::from("docpivot.log"));

        let (dir, name) = split_log_path(Path::new("docpivot.log")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, PathBuf::from("docpivot.log"));
    }

    #[test]
    fn test_split_log_path_without_file_name() {
        assert!(matches!(
            split_log_path(Path::new("/")),
            Err(LoggingError::FilePath(_))
        ));
    }
}
