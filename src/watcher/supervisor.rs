//! Watch-loop supervision
//!
//! The supervisor owns the restart policy: whenever the watch loop
//! terminates — by error or by the stream ending — it logs the outcome,
//! waits a fixed delay, and starts a fresh loop. With no restart budget
//! configured it runs forever; the process is expected to live under an
//! external restart policy anyway.

use crate::config::SupervisorConfig;
use crate::error::Result;
use anyhow::anyhow;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

/// Restarts the watch loop after every termination.
pub struct Supervisor {
    restart_delay: Duration,
    max_restarts: Option<u32>,
}

impl Supervisor {
    /// Creates a supervisor from configuration.
    pub fn new(config: &SupervisorConfig) -> Self {
        Self {
            restart_delay: Duration::from_secs(config.restart_delay_secs),
            max_restarts: config.max_restarts,
        }
    }

    /// Runs watch loops produced by `watch` until the restart budget is
    /// exhausted.
    ///
    /// `watch` is invoked once per attempt; each termination — `Err` or a
    /// clean end of stream, which should not happen against a live
    /// cluster — is logged and followed by the restart delay. With the
    /// default unlimited budget this method never returns.
    pub async fn run<F, Fut>(&self, mut watch: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let mut terminations: u32 = 0;

        loop {
            match watch().await {
                Ok(()) => warn!("Watch stream ended without error; treating as failure"),
                Err(e) => error!(error = %e, "Watch loop failed"),
            }

            terminations += 1;
            if let Some(max) = self.max_restarts {
                if terminations > max {
                    return Err(anyhow!(
                        "watch loop terminated {} times; restart budget exhausted",
                        terminations
                    ));
                }
            }

            info!(
                delay_secs = self.restart_delay.as_secs(),
                "Restarting watch loop"
            );
            tokio::time::sleep(self.restart_delay).await;
        }
    }
}
