//! Log setup.
//!
//! The terminal runs in raw mode on the alternate screen, so log lines never
//! go to stdout or stderr. They go to the configured file, or nowhere.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::DashboardConfig;
use crate::dashboard::DashboardError;

/// Parse a log filter directive.
pub fn build_filter(directive: &str) -> Result<EnvFilter, DashboardError> {
    EnvFilter::try_new(directive).map_err(|e| DashboardError::Logging(e.to_string()))
}

fn open_log_file(path: &Path) -> Result<File, DashboardError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| DashboardError::Logging(format!("{}: {}", path.display(), e)))
}

/// Install the global subscriber.
pub fn init_logging(config: &DashboardConfig) -> Result<(), DashboardError> {
    let env_filter = build_filter(&config.log_level)?;

    let file_layer = match &config.log_file {
        Some(path) => Some(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(open_log_file(path)?))
                .with_target(true)
                .with_ansi(false),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .map_err(|e| DashboardError::Logging(e.to_string()))?;

    tracing::info!(
        log_level = %config.log_level,
        log_file = ?config.log_file,
        "logging initialized"
    );

    Ok(())
}
