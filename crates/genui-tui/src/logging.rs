//! File logging.
//!
//! The terminal belongs to the UI, so tracing output goes to a daily rolling
//! file under the user's data directory. `RUST_LOG` overrides the default
//! filter.

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE_PREFIX: &str = "genui.log";

fn build_filter_directives(is_dev: bool) -> String {
    [
        if is_dev { "debug" } else { "info" },
        "hyper=warn",
        "reqwest=warn",
        "syntect=warn",
    ]
    .join(",")
}

pub fn log_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("Could not determine data directory"))?;
    Ok(data_dir.join("genui").join("logs"))
}

/// Install the global subscriber; keep the returned guard alive until exit so
/// buffered lines are flushed
pub fn init() -> Result<WorkerGuard> {
    let dir = log_dir()?;
    fs::create_dir_all(&dir)?;

    let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(build_filter_directives(cfg!(debug_assertions))));

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()?;

    tracing::info!(dir = %dir.display(), version = env!("CARGO_PKG_VERSION"), "logging initialized");
    Ok(guard)
}
