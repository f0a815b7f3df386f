//! Logging Infrastructure
//!
//! `RUST_LOG` overrides the configured level when set. With a log directory the
//! output goes to a daily rolling file instead of stdout.

use std::path::Path;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the logger with default settings (stdout, `info`)
pub fn init_logger() {
    init_logger_with_file(None, false, None);
}

/// Initialize the logger with optional JSON formatting and file output
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logger_with_file(log_level: Option<&str>, json: bool, log_dir: Option<&Path>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_appender = log_dir
        .filter(|dir| dir.exists())
        .map(|dir| tracing_appender::rolling::daily(dir, "order-server"));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match (file_appender, json) {
        (Some(appender), true) => registry
            .with(fmt::layer().json().with_writer(appender))
            .try_init(),
        (Some(appender), false) => registry
            .with(fmt::layer().with_ansi(false).with_target(false).with_writer(appender))
            .try_init(),
        (None, true) => registry.with(fmt::layer().json()).try_init(),
        (None, false) => registry.with(fmt::layer().with_target(false)).try_init(),
    };

    if result.is_err() {
        tracing::debug!("Logger already initialized");
    }
}
