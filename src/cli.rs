//! Command-line interface definition for lbwatch
//!
//! This module defines the CLI structure using clap's derive API. The tool
//! is a single-purpose daemon, so the interface is flag-style rather than
//! subcommand-based: every flag is an override on top of the configuration
//! file and environment.

use crate::watcher::TriggerScope;
use clap::Parser;
use std::path::PathBuf;

/// lbwatch - LoadBalancer service watcher
///
/// Watches Kubernetes Service resources across all namespaces and
/// dispatches a GitHub Actions workflow when a LoadBalancer service is
/// added, modified, or deleted, debounced by a cooldown window.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "lbwatch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Cooldown window between workflow dispatches, in seconds
    #[arg(long)]
    pub cooldown_secs: Option<u64>,

    /// Cooldown scope: one shared window, or one window per service
    #[arg(long, value_enum)]
    pub scope: Option<TriggerScope>,

    /// Delay before restarting a failed watch loop, in seconds
    #[arg(long)]
    pub restart_delay_secs: Option<u64>,

    /// Maximum watch-loop restarts before giving up (default: unlimited)
    #[arg(long)]
    pub max_restarts: Option<u32>,

    /// Git ref the workflow is dispatched on
    #[arg(long)]
    pub git_ref: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Append logs to this file in addition to stdout
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Resolve workflows but skip the dispatch call
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["lbwatch"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("config/config.yaml"));
        assert_eq!(cli.cooldown_secs, None);
        assert_eq!(cli.scope, None);
        assert!(!cli.json_logs);
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::try_parse_from([
            "lbwatch",
            "--cooldown-secs",
            "60",
            "--scope",
            "per-resource",
            "--restart-delay-secs",
            "10",
            "--max-restarts",
            "3",
            "--git-ref",
            "release",
            "--json-logs",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(cli.cooldown_secs, Some(60));
        assert_eq!(cli.scope, Some(TriggerScope::PerResource));
        assert_eq!(cli.restart_delay_secs, Some(10));
        assert_eq!(cli.max_restarts, Some(3));
        assert_eq!(cli.git_ref.as_deref(), Some("release"));
        assert!(cli.json_logs);
        assert!(cli.dry_run);
    }

    #[test]
    fn test_cli_rejects_invalid_scope() {
        let result = Cli::try_parse_from(["lbwatch", "--scope", "everywhere"]);
        assert!(result.is_err());
    }
}
