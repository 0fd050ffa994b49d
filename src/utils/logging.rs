use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::LoggingConfig;
use crate::utils::error::{AppError, Result};

const LOG_FILE_PREFIX: &str = "price-watcher.log";

/// Install the global subscriber. `RUST_LOG` wins over `logging.level`.
///
/// When a log directory is configured a daily-rolling file layer is added;
/// the returned guard must be held for the lifetime of the process or
/// buffered lines are lost on exit.
pub fn init_tracing(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive(&config.level))
            .map_err(|e| AppError::Validation(format!("Invalid log level '{}': {}", config.level, e)))?,
    };

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false));

    match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .try_init()
                .map_err(|e| AppError::Internal(format!("Failed to install tracing subscriber: {}", e)))?;
            Ok(Some(guard))
        }
        None => {
            registry
                .try_init()
                .map_err(|e| AppError::Internal(format!("Failed to install tracing subscriber: {}", e)))?;
            Ok(None)
        }
    }
}

fn default_directive(level: &str) -> String {
    format!("price_watcher={}", level.trim().to_lowercase())
}
