//! lbwatch - Kubernetes LoadBalancer service watcher library
//!
//! This library provides the core functionality for lbwatch: a control
//! loop that watches Service resources across all namespaces and
//! dispatches a GitHub Actions workflow when a LoadBalancer service is
//! added, modified, or deleted, debounced by a cooldown window.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `watcher`: Event classification, rate limiting, the watch loop, and
//!   the supervisor that restarts it
//! - `github`: The workflow dispatch client
//! - `config`: Configuration management and validation
//! - `logging`: Tracing subscriber setup
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition

pub mod cli;
pub mod config;
pub mod error;
pub mod github;
pub mod logging;
pub mod watcher;

// Re-export commonly used types
pub use config::Config;
pub use error::{LbwatchError, Result};
pub use github::{DispatchError, WorkflowClient, WorkflowDispatcher};
pub use watcher::{
    classify, Decision, EventKind, RateLimiter, ServiceChangeEvent, ServiceWatcher, Supervisor,
    TriggerScope,
};
