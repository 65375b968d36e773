//! Structured logging setup
//!
//! Provides JSON-formatted and human-readable logging with optional file
//! output. Integrates with the tracing ecosystem for structured event
//! logging.

use crate::config::LoggingConfig;
use crate::error::{LbwatchError, Result};
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging based on configuration.
///
/// `RUST_LOG` takes precedence; otherwise the configured level applies to
/// the crate's own events. Must be called once, before any spans or
/// events are emitted.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("lbwatch={}", config.level)))
        .map_err(|e| LbwatchError::Logging(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json {
        let stdout_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true);

        if let Some(file_path) = &config.file {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(file_path)
                .map_err(LbwatchError::Io)?;

            let file_layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(Arc::new(file));

            registry.with(stdout_layer).with(file_layer).init();
        } else {
            registry.with(stdout_layer).init();
        }
    } else {
        let stdout_layer = fmt::layer().with_target(true).with_level(true);

        if let Some(file_path) = &config.file {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(file_path)
                .map_err(LbwatchError::Io)?;

            let file_layer = fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_writer(Arc::new(file));

            registry.with(stdout_layer).with(file_layer).init();
        } else {
            registry.with(stdout_layer).init();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level_builds_a_valid_filter() {
        let config = LoggingConfig::default();
        let filter = EnvFilter::try_new(format!("lbwatch={}", config.level));
        assert!(filter.is_ok());
    }

    #[test]
    fn test_garbage_level_is_rejected() {
        let filter = EnvFilter::try_new("lbwatch=definitely-not-a-level");
        assert!(filter.is_err());
    }
}
