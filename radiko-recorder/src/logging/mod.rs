//! Logging setup.
//!
//! This module provides:
//! - An `EnvFilter` driven by `RUST_LOG`, with a sensible default
//! - Console output (human-readable or JSON) with local timezone timestamps
//! - Optional daily-rotated log files

use chrono::Local;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::Writer, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::utils::fs;

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "radiko_recorder=info,tower_http=info";

/// File name prefix of rotated log files.
const LOG_FILE_PREFIX: &str = "radiko-recorder.log";

/// Custom timer that uses the local timezone via chrono.
#[derive(Debug, Clone, Copy)]
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Logging options collected from the command line.
#[derive(Debug, Clone, Default)]
pub struct LoggingOptions {
    /// Emit console logs as JSON lines.
    pub json: bool,
    /// Also write daily-rotated log files into this directory.
    pub log_dir: Option<PathBuf>,
}

/// Keeps the background file writer alive; flushes on drop.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the global subscriber.
pub fn init_logging(options: &LoggingOptions) -> crate::Result<LoggingGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let (file_writer, file_guard) = match &options.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .map_err(|e| fs::io_error("creating log directory", dir, e))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with((!options.json).then(|| fmt::layer().with_timer(LocalTimer)))
        .with(options.json.then(|| fmt::layer().json().with_timer(LocalTimer)))
        .with(file_writer.map(|writer| {
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_timer(LocalTimer)
        }))
        .try_init()
        .map_err(|e| {
            crate::Error::Other(format!("Failed to set global default subscriber: {}", e))
        })?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_is_valid() {
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }

    #[test]
    fn test_local_timer_writes_offset() {
        let mut out = String::new();
        LocalTimer.format_time(&mut Writer::new(&mut out)).unwrap();
        // e.g. 2024-05-20T00:00:00.000+09:00
        assert_eq!(out.len(), 29);
        assert_eq!(&out[10..11], "T");
    }
}
