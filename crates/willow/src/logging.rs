//! Tracing setup: stdout plus an optional daily-rolling file.

use crate::{AppError, AppResult, config::LoggingConfig};

use std::{fs, panic::Location};

use error_location::ErrorLocation;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "willow.log";

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured filter. The returned guard flushes
/// the file writer on drop and must be held until exit.
#[track_caller]
pub fn init(config: &LoggingConfig) -> AppResult<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| AppError::ConfigError {
            reason: format!("Invalid log filter {:?}: {}", config.filter, e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    let stdout = fmt::layer().with_target(false);

    let (file, guard) = match &config.directory {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout)
        .with(file)
        .try_init()
        .map_err(|e| AppError::RuntimeError {
            reason: format!("Failed to install tracing subscriber: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    Ok(guard)
}
