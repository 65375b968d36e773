//! Error types for lbwatch
//!
//! This module defines the error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for lbwatch operations
///
/// Covers configuration loading, the cluster watch subscription, and
/// logging setup. Failures of a single workflow dispatch are not part of
/// this taxonomy; they are [`crate::github::DispatchError`] values which
/// the watch loop logs and absorbs per attempt.
#[derive(Error, Debug)]
pub enum LbwatchError {
    /// Configuration-related errors (file parse, invalid values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cluster watch subscription errors (connect, stream broken,
    /// server-side watch error events)
    #[error("Subscription error: {0}")]
    Subscription(String),

    /// Logging initialization errors
    #[error("Logging error: {0}")]
    Logging(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for lbwatch operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
