//! GitHub API client for workflow dispatch.
//!
//! Resolves the configured workflow by listing the repository's workflows
//! and matching the configured filename as a path suffix, then creates a
//! `workflow_dispatch` event for it. Every failure mode carries enough
//! detail (HTTP status and response body where available) to diagnose from
//! the logs alone; none of them is fatal to the process.

use crate::config::GithubConfig;
use crate::watcher::ServiceChangeEvent;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during a dispatch attempt.
///
/// The watch loop logs these and moves on; a failed dispatch is retried
/// only on the next qualifying event.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A required configuration value is absent.
    #[error("configuration missing: {0} is not set")]
    ConfigurationMissing(&'static str),

    /// No workflow path matched the configured filename.
    #[error("workflow {0} not found in repository")]
    WorkflowNotFound(String),

    /// The GitHub API rejected the request.
    #[error("GitHub API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, when one was readable.
        body: String,
    },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Workflow descriptor from the list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Workflow {
    /// Numeric workflow id used in the dispatch URL.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Repository path, e.g. `.github/workflows/deploy.yml`.
    pub path: String,
}

/// Response wrapper for the workflow list endpoint.
#[derive(Debug, Deserialize)]
struct WorkflowList {
    total_count: u32,
    workflows: Vec<Workflow>,
}

/// Body of a `workflow_dispatch` creation request.
#[derive(Debug, Serialize)]
struct DispatchRequest<'a> {
    #[serde(rename = "ref")]
    git_ref: &'a str,
    inputs: BTreeMap<&'static str, &'a str>,
}

/// Seam between the watch loop and the GitHub client, so the loop can be
/// exercised with a recording fake in tests.
#[async_trait]
pub trait WorkflowDispatcher: Send + Sync {
    /// Dispatch the configured workflow for a qualifying service event.
    async fn dispatch(&self, event: &ServiceChangeEvent) -> Result<(), DispatchError>;
}

/// GitHub API client for workflow dispatch.
pub struct WorkflowClient {
    http: Client,
    config: GithubConfig,
    token: String,
    dry_run: bool,
}

impl WorkflowClient {
    /// Creates a client from the GitHub configuration.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::ConfigurationMissing` when the token is
    /// absent, or `DispatchError::Http` if the HTTP client cannot be
    /// built.
    pub fn new(config: GithubConfig, dry_run: bool) -> Result<Self, DispatchError> {
        let token = match config.token.as_deref() {
            Some(token) if !token.is_empty() => token.to_string(),
            _ => return Err(DispatchError::ConfigurationMissing("GITHUB_TOKEN")),
        };

        let http = Client::builder()
            .user_agent(concat!("lbwatch/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            config,
            token,
            dry_run,
        })
    }

    /// Builds a request with authentication and API headers.
    fn build_request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.api_base, path);
        self.http
            .request(method, &url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    /// Lists all workflows of a repository.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Api` with the status and body on a non-2xx
    /// response.
    pub async fn list_workflows(&self, repo: &str) -> Result<Vec<Workflow>, DispatchError> {
        let response = self
            .build_request(
                reqwest::Method::GET,
                &format!("/repos/{}/actions/workflows", repo),
            )
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let list: WorkflowList = response.json().await?;
            debug!(
                repo = %repo,
                total = list.total_count,
                "Listed repository workflows"
            );
            Ok(list.workflows)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(DispatchError::Api {
                status: status.as_u16(),
                body,
            })
        }
    }

    /// Resolves the configured workflow file against the repository.
    ///
    /// Every discovered workflow is logged as a diagnostic aid before the
    /// suffix match, so a `WorkflowNotFound` error can be diagnosed from
    /// the log alone.
    async fn resolve_workflow(
        &self,
        repo: &str,
        workflow_file: &str,
    ) -> Result<Workflow, DispatchError> {
        let workflows = self.list_workflows(repo).await?;

        for workflow in &workflows {
            info!(
                id = workflow.id,
                name = %workflow.name,
                path = %workflow.path,
                "Discovered workflow"
            );
        }

        workflows
            .into_iter()
            .find(|w| w.path.ends_with(workflow_file))
            .ok_or_else(|| DispatchError::WorkflowNotFound(workflow_file.to_string()))
    }

    /// Builds the dispatch inputs from the configured tenant and project.
    ///
    /// Missing values are skipped and warned about; GitHub validates
    /// required workflow inputs on its side.
    fn build_inputs(&self) -> BTreeMap<&'static str, &str> {
        let mut inputs = BTreeMap::new();

        match self.config.tenant.as_deref() {
            Some(tenant) => {
                inputs.insert("tenant", tenant);
            }
            None => warn!("TENANT is not set; dispatching without a tenant input"),
        }
        match self.config.project.as_deref() {
            Some(project) => {
                inputs.insert("project", project);
            }
            None => warn!("PROJECT is not set; dispatching without a project input"),
        }

        inputs
    }
}

#[async_trait]
impl WorkflowDispatcher for WorkflowClient {
    /// Dispatches the configured workflow for a qualifying service event.
    ///
    /// Fails fast when the repository or workflow file is not configured,
    /// resolves the workflow by filename suffix, then creates the
    /// `workflow_dispatch` event on the configured ref. GitHub answers
    /// 204 on success.
    async fn dispatch(&self, event: &ServiceChangeEvent) -> Result<(), DispatchError> {
        let repo = self
            .config
            .repo
            .as_deref()
            .ok_or(DispatchError::ConfigurationMissing("GITHUB_REPO"))?;
        let workflow_file = self
            .config
            .workflow_file
            .as_deref()
            .ok_or(DispatchError::ConfigurationMissing("WORKFLOW_FILE"))?;

        let workflow = self.resolve_workflow(repo, workflow_file).await?;

        info!(
            id = workflow.id,
            path = %workflow.path,
            git_ref = %self.config.git_ref,
            event_kind = %event.kind,
            service = %event.key(),
            "Selected workflow for dispatch"
        );

        if self.dry_run {
            info!("Dry-run mode enabled: skipping workflow dispatch");
            return Ok(());
        }

        let request = DispatchRequest {
            git_ref: &self.config.git_ref,
            inputs: self.build_inputs(),
        };

        let response = self
            .build_request(
                reqwest::Method::POST,
                &format!("/repos/{}/actions/workflows/{}/dispatches", repo, workflow.id),
            )
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!(
                id = workflow.id,
                event_kind = %event.kind,
                service = %event.key(),
                "Workflow dispatch accepted"
            );
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(DispatchError::Api {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_missing_display() {
        let err = DispatchError::ConfigurationMissing("GITHUB_REPO");
        assert_eq!(
            err.to_string(),
            "configuration missing: GITHUB_REPO is not set"
        );
    }

    #[test]
    fn test_workflow_not_found_display() {
        let err = DispatchError::WorkflowNotFound("deploy.yml".to_string());
        assert_eq!(err.to_string(), "workflow deploy.yml not found in repository");
    }

    #[test]
    fn test_api_error_display_carries_status_and_body() {
        let err = DispatchError::Api {
            status: 422,
            body: "Unexpected inputs provided".to_string(),
        };
        let s = err.to_string();
        assert!(s.contains("422"));
        assert!(s.contains("Unexpected inputs provided"));
    }

    #[test]
    fn test_workflow_list_deserialization() {
        let json = r#"{
            "total_count": 2,
            "workflows": [
                {"id": 161335, "name": "CI", "path": ".github/workflows/ci.yml", "state": "active"},
                {"id": 269289, "name": "Deploy", "path": ".github/workflows/deploy.yml", "state": "active"}
            ]
        }"#;
        let list: WorkflowList = serde_json::from_str(json).unwrap();
        assert_eq!(list.total_count, 2);
        assert_eq!(list.workflows[1].path, ".github/workflows/deploy.yml");
    }

    #[test]
    fn test_dispatch_request_serialization() {
        let mut inputs = BTreeMap::new();
        inputs.insert("tenant", "acme");
        inputs.insert("project", "edge");
        let request = DispatchRequest {
            git_ref: "main",
            inputs,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["ref"], "main");
        assert_eq!(json["inputs"]["tenant"], "acme");
        assert_eq!(json["inputs"]["project"], "edge");
    }

    #[test]
    fn test_client_requires_token() {
        let config = crate::config::GithubConfig::default();
        let result = WorkflowClient::new(config, false);
        assert!(matches!(
            result,
            Err(DispatchError::ConfigurationMissing("GITHUB_TOKEN"))
        ));
    }
}
