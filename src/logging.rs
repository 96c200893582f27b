//! Logging configuration using the tracing framework
//!
//! Logs can be controlled via the RUST_LOG environment variable.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Controls log level (e.g., "debug", "info", "warn", "error")
//!   - Default: "contest_points=info,warn"
//!   - Examples:
//!     - `RUST_LOG=contest_points=debug` - Debug logs for this crate only
//!     - `RUST_LOG=contest_points::session=trace` - Trace every cascade transition

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "contest_points=info,warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize console logging for the one-shot subcommands
///
/// Output goes to stderr so that tables printed on stdout stay pipeable.
///
/// ```no_run
/// use contest_points::logging;
///
/// logging::init();
/// tracing::info!("Application started");
/// ```
pub fn init() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_line_number(true)
                .with_file(false),
        )
        .init();
}

/// Directory that receives rolling log files
pub fn log_dir() -> std::io::Result<PathBuf> {
    if let Some(proj_dirs) =
        directories::ProjectDirs::from("com", "contest-points", "contest-points")
    {
        let log_path = proj_dirs.data_dir().join("logs");
        std::fs::create_dir_all(&log_path)?;
        Ok(log_path)
    } else {
        std::env::current_dir()
    }
}

/// Initialize logging with file output only
///
/// The interactive terminal owns stdout, so the TUI logs to a daily
/// rolling file instead. Keep the returned guard alive until exit or
/// buffered lines are lost.
///
/// ```no_run
/// use contest_points::logging;
///
/// let _guard = logging::init_with_file("contest-points.log").expect("Failed to initialize logging");
/// ```
pub fn init_with_file(log_file_name: &str) -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir()?, log_file_name);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()?;

    Ok(guard)
}

/// Initialize logging for tests
///
/// Only errors are shown by default.
pub fn init_test() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_test_writer())
        .try_init()
        .ok(); // Ignore errors if already initialized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_is_idempotent() {
        init_test();
        init_test();
    }

    #[test]
    fn test_structured_logging() {
        init_test();

        tracing::info!(segment = "Service", points = 10u64, "Structured log message");
        tracing::debug!("debug message");
    }
}
