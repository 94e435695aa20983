//! Tracing setup
//!
//! ## Behavior
//!
//! - **Filter**: `RUST_LOG` wins when set; otherwise the configured level
//!   plus per-crate directives from [`build_filter_directives`].
//! - **Stdout**: always on, `2025-01-15 10:30:45.123 INFO file.rs:42 target: message`.
//! - **File**: only when `log_dir` is configured; non-blocking, no ANSI.
//!   If the file cannot be set up, logging continues on stdout only.
//!
//! Call once, early, before starting the event source:
//!
//! ```ignore
//! let config = clipsignal::bootstrap::config::load_config("clipsignal.toml")?;
//! clipsignal::bootstrap::tracing::init_tracing_subscriber(&config.logging)?;
//! let signal = clipsignal::ClipboardSignal::start(&config);
//! ```

use std::path::Path;
use std::{fs, io, sync::OnceLock};

use anyhow::Context;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

use super::config::LoggingConfig;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const LOG_FILE_NAME: &str = "clipsignal.log";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Default filter directives for `level`.
pub fn build_filter_directives(level: &str) -> Vec<String> {
    let level = match level.trim() {
        "" => "info",
        trimmed => trimmed,
    };
    vec![
        level.to_string(),
        format!("clipsignal={level}"),
        format!("cs_core={level}"),
        format!("cs_platform={level}"),
        "clipboard_rs=warn".to_string(), // x11 backend is chatty at debug
    ]
}

/// Register the global subscriber.
///
/// # Errors
///
/// Returns `Err` if the filter directives are invalid or a global
/// subscriber is already registered.
pub fn init_tracing_subscriber(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(build_filter_directives(&config.level).join(","))
            .with_context(|| format!("Invalid log level: {}", config.level))?,
    };

    let stdout_layer = fmt::layer()
        .with_timer(fmt::time::ChronoUtc::new(TIMESTAMP_FORMAT.to_string()))
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_ansi(config.ansi)
        .with_writer(io::stdout);

    let file_writer = match config.log_dir.as_deref().map(build_file_writer) {
        Some(Ok(writer)) => Some(writer),
        Some(Err(err)) => {
            eprintln!("Failed to initialize file logging, falling back to stdout: {err:#}");
            None
        }
        None => None,
    };
    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_timer(fmt::time::ChronoUtc::new(TIMESTAMP_FORMAT.to_string()))
            .with_level(true)
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_ansi(false)
            .with_writer(writer)
    });

    registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .context("Tracing subscriber already initialized")?;

    Ok(())
}

fn build_file_writer(log_dir: &Path) -> anyhow::Result<NonBlocking> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    LOG_GUARD
        .set(guard)
        .map_err(|_| anyhow::anyhow!("Tracing log guard already initialized"))?;

    Ok(non_blocking)
}
