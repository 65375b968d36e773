//! Configuration management for lbwatch
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from a YAML file, environment variables, and CLI
//! overrides. Precedence is built-in defaults, then the file, then the
//! environment, then the CLI.

use crate::cli::Cli;
use crate::error::{LbwatchError, Result};
use crate::watcher::TriggerScope;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for lbwatch
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// GitHub dispatch target settings
    #[serde(default)]
    pub github: GithubConfig,

    /// Dispatch cooldown settings
    #[serde(default)]
    pub cooldown: CooldownConfig,

    /// Watch-loop restart settings
    #[serde(default)]
    pub supervisor: SupervisorConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// GitHub dispatch target configuration
///
/// The repository and workflow file have no defaults: when either is
/// missing, dispatch attempts are skipped with a configuration error
/// rather than failing the process. The token never comes from the file;
/// it is environment-only (`GITHUB_TOKEN`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Target repository in `owner/name` form (`GITHUB_REPO`)
    #[serde(default)]
    pub repo: Option<String>,

    /// Workflow filename to dispatch, matched as a path suffix
    /// (`WORKFLOW_FILE`)
    #[serde(default)]
    pub workflow_file: Option<String>,

    /// Git ref the workflow runs on
    #[serde(default = "default_git_ref")]
    pub git_ref: String,

    /// Tenant passed as a workflow input (`TENANT`)
    #[serde(default)]
    pub tenant: Option<String>,

    /// Project passed as a workflow input (`PROJECT`)
    #[serde(default)]
    pub project: Option<String>,

    /// API base URL; override to point at a mock server in tests
    /// (`GITHUB_API_URL`)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Request timeout in seconds
    #[serde(default = "default_github_timeout")]
    pub timeout_secs: u64,

    /// API token, environment-only
    #[serde(skip)]
    pub token: Option<String>,
}

fn default_git_ref() -> String {
    "main".to_string()
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_github_timeout() -> u64 {
    30
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            repo: None,
            workflow_file: None,
            git_ref: default_git_ref(),
            tenant: None,
            project: None,
            api_base: default_api_base(),
            timeout_secs: default_github_timeout(),
            token: None,
        }
    }
}

/// Dispatch cooldown configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooldownConfig {
    /// Minimum seconds between successful dispatches
    #[serde(default = "default_cooldown_secs")]
    pub secs: u64,

    /// Window granularity: `global` or `per-resource`
    #[serde(default)]
    pub scope: TriggerScope,
}

fn default_cooldown_secs() -> u64 {
    180
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            secs: default_cooldown_secs(),
            scope: TriggerScope::default(),
        }
    }
}

/// Watch-loop restart configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Seconds to wait before restarting a terminated watch loop
    #[serde(default = "default_restart_delay")]
    pub restart_delay_secs: u64,

    /// Restart budget; `None` restarts forever
    #[serde(default)]
    pub max_restarts: Option<u32>,
}

fn default_restart_delay() -> u64 {
    5
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            restart_delay_secs: default_restart_delay(),
            max_restarts: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON-formatted logs
    #[serde(default)]
    pub json: bool,

    /// Append logs to this file in addition to stdout
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            file: None,
        }
    }
}

impl Config {
    /// Load configuration with environment and CLI overrides.
    ///
    /// A missing file is not an error (defaults apply); an unreadable or
    /// malformed file is.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    /// * `cli` - Parsed CLI arguments for overrides
    pub fn load(path: impl AsRef<Path>, cli: &Cli) -> Result<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(LbwatchError::Io)?;
            serde_yaml::from_str::<Config>(&contents).map_err(LbwatchError::Yaml)?
        } else {
            Config::default()
        };

        config.apply_env();
        config.apply_cli(cli);
        config.validate()?;

        Ok(config)
    }

    /// Overlay values from the process environment.
    fn apply_env(&mut self) {
        if let Some(token) = env_non_empty("GITHUB_TOKEN") {
            self.github.token = Some(token);
        }
        if let Some(repo) = env_non_empty("GITHUB_REPO") {
            self.github.repo = Some(repo);
        }
        if let Some(file) = env_non_empty("WORKFLOW_FILE") {
            self.github.workflow_file = Some(file);
        }
        if let Some(tenant) = env_non_empty("TENANT") {
            self.github.tenant = Some(tenant);
        }
        if let Some(project) = env_non_empty("PROJECT") {
            self.github.project = Some(project);
        }
        if let Some(api_base) = env_non_empty("GITHUB_API_URL") {
            self.github.api_base = api_base;
        }
    }

    /// Overlay values from the CLI.
    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(secs) = cli.cooldown_secs {
            self.cooldown.secs = secs;
        }
        if let Some(scope) = cli.scope {
            self.cooldown.scope = scope;
        }
        if let Some(delay) = cli.restart_delay_secs {
            self.supervisor.restart_delay_secs = delay;
        }
        if let Some(max) = cli.max_restarts {
            self.supervisor.max_restarts = Some(max);
        }
        if let Some(git_ref) = &cli.git_ref {
            self.github.git_ref = git_ref.clone();
        }
        if cli.json_logs {
            self.logging.json = true;
        }
        if let Some(file) = &cli.log_file {
            self.logging.file = Some(file.clone());
        }
        if cli.verbose {
            self.logging.level = "debug".to_string();
        }
    }

    /// Validate value ranges.
    ///
    /// The mandatory-token check is separate ([`Config::require_token`]):
    /// it is a startup precondition with a defined exit code, not a parse
    /// error.
    pub fn validate(&self) -> Result<()> {
        if self.cooldown.secs == 0 {
            return Err(
                LbwatchError::Config("cooldown.secs must be greater than zero".to_string()).into(),
            );
        }
        if self.github.timeout_secs == 0 {
            return Err(LbwatchError::Config(
                "github.timeout_secs must be greater than zero".to_string(),
            )
            .into());
        }
        Ok(())
    }

    /// Returns the GitHub token, or an error when it is absent.
    ///
    /// The caller (`main`) converts this into exit code 1 before any
    /// network activity.
    pub fn require_token(&self) -> Result<&str> {
        match self.github.token.as_deref() {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(LbwatchError::Config(
                "GITHUB_TOKEN environment variable must be set".to_string(),
            )
            .into()),
        }
    }
}

/// Reads an environment variable, treating empty values as unset.
fn env_non_empty(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}
