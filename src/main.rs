//! lbwatch - Kubernetes LoadBalancer service watcher
//!
//! Main entry point: loads configuration, checks the startup
//! preconditions, and runs the supervised watch loop forever.

use std::process;
use std::sync::Arc;
use std::time::Duration;

use lbwatch::cli::Cli;
use lbwatch::config::Config;
use lbwatch::github::WorkflowClient;
use lbwatch::watcher::{RateLimiter, ServiceWatcher, Supervisor};
use lbwatch::{logging, Result};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments and load configuration
    let cli = Cli::parse_args();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| "config/config.yaml".to_string());
    let config = Config::load(&config_path, &cli)?;

    logging::init(&config.logging)?;

    // The token is the only hard startup precondition; everything else
    // degrades to per-attempt errors.
    if let Err(e) = config.require_token() {
        error!(error = %e, "Startup precondition failed");
        process::exit(1);
    }

    info!(
        repo = config.github.repo.as_deref().unwrap_or("<unset>"),
        workflow_file = config.github.workflow_file.as_deref().unwrap_or("<unset>"),
        git_ref = %config.github.git_ref,
        cooldown_secs = config.cooldown.secs,
        scope = ?config.cooldown.scope,
        restart_delay_secs = config.supervisor.restart_delay_secs,
        dry_run = cli.dry_run,
        "Starting lbwatch"
    );

    let dispatcher = WorkflowClient::new(config.github.clone(), cli.dry_run)?;
    let limiter = RateLimiter::new(
        Duration::from_secs(config.cooldown.secs),
        config.cooldown.scope,
    );
    let watcher = Arc::new(ServiceWatcher::new(dispatcher, limiter));
    let supervisor = Supervisor::new(&config.supervisor);

    supervisor
        .run(|| {
            let watcher = Arc::clone(&watcher);
            async move { watcher.run().await }
        })
        .await
}
