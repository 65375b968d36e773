//! Watcher module for monitoring LoadBalancer services and dispatching
//! workflows
//!
//! # Overview
//!
//! The watcher is the control loop of lbwatch:
//! 1. Subscribes to the cluster's Service watch stream
//! 2. Classifies events, keeping LoadBalancer add/modify/delete
//! 3. Consults the cooldown rate limiter
//! 4. Dispatches the configured GitHub Actions workflow
//! 5. Is restarted by the supervisor whenever the stream terminates
//!
//! # Modules
//!
//! - [`classifier`]: Event filtering and resource-key derivation
//! - [`limiter`]: Cooldown window enforcement
//! - [`watcher`]: The long-lived watch loop
//! - [`supervisor`]: Restart-forever policy around the loop

pub mod classifier;
pub mod limiter;
pub mod supervisor;
#[allow(clippy::module_inception)]
pub mod watcher;

pub use classifier::{classify, EventKind, ServiceChangeEvent, LOAD_BALANCER_TYPE};
pub use limiter::{Decision, RateLimiter, TriggerScope};
pub use supervisor::Supervisor;
pub use watcher::ServiceWatcher;
