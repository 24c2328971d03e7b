//! Logging configuration for ThreadQA
//!
//! Diagnostic output only. Question/answer records go to the
//! interaction log, not here.

use std::path::Path;

use tracing_subscriber::fmt;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

use crate::Result;
use crate::ThreadQaError;

/// Initialize logging with configuration
pub fn init_logging_with_config(config: Option<&crate::config::AppConfig>) -> Result<()> {
    let (level, logs_dir) = match config {
        Some(config) => (config.logging.level.as_str(), config.logging.dir.as_path()),
        None => ("info", Path::new("logs")),
    };
    init_registry(level, logs_dir)
}

/// Initialize logging with a custom log level, writing files under `logs_dir`
pub fn init_logging_with_level(level: &str, logs_dir: &Path) -> Result<()> {
    init_registry(level, logs_dir)
}

fn init_registry(level: &str, logs_dir: &Path) -> Result<()> {
    if !logs_dir.exists() {
        std::fs::create_dir_all(logs_dir)?;
    }

    // RUST_LOG wins over the configured level
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,threadqa={level}")));

    let file_appender = tracing_appender::rolling::daily(logs_dir, "threadqa.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(non_blocking)
        .with_ansi(false); // No colors in file

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| ThreadQaError::ConfigError(format!("logging already initialized: {e}")))?;

    tracing::info!(
        "Logging initialized with level: {} - files in {}/threadqa.log.YYYY-MM-DD",
        level,
        logs_dir.display()
    );

    // Keep the writer thread alive for the rest of the process
    std::mem::forget(guard);

    Ok(())
}

/// Initialize simple stderr logging for testing
pub fn init_simple_logging() -> Result<()> {
    // Ignore the error when a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_target(true)
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .try_init();

    tracing::info!("Simple logging initialized");
    Ok(())
}
