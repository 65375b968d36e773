//! GitHub Actions workflow dispatch
//!
//! This module wraps the subset of the GitHub REST API the watcher needs:
//! listing the workflows of a repository and creating a
//! `workflow_dispatch` event for one of them.

pub mod client;

pub use client::{DispatchError, Workflow, WorkflowClient, WorkflowDispatcher};
