//! Vercel client: CLI for deploys and aliases, REST API for lookups

use super::args::{alias_args, deploy_args, parse_deployment_url};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::exec::{CommandLine, CommandRunner};
use crate::output::ActionFiles;
use crate::traits::DeployPlatform;
use crate::types::{Commit, VercelDeployment};
use serde_json::Value;

/// Default Vercel API endpoint
pub const DEFAULT_API_URL: &str = "https://api.vercel.com";

/// Default name of the Vercel CLI executable
pub const DEFAULT_VERCEL_BIN: &str = "vercel";

/// Client options not covered by [`Settings`]
#[derive(Debug, Clone)]
pub struct VercelOptions {
    /// Vercel CLI executable
    pub vercel_bin: String,
    /// Vercel REST API base URL
    pub api_url: String,
    /// Build the deployment record from the URL instead of calling the API
    pub skip_lookup: bool,
}

impl Default for VercelOptions {
    fn default() -> Self {
        Self {
            vercel_bin: DEFAULT_VERCEL_BIN.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            skip_lookup: false,
        }
    }
}

/// Deploys through the Vercel CLI
pub struct VercelClient<'a, R> {
    settings: &'a Settings,
    runner: R,
    options: VercelOptions,
    http: reqwest::Client,
    envs: Vec<(String, String)>,
    deployment_url: Option<String>,
}

impl<R> std::fmt::Debug for VercelClient<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VercelClient")
            .field("options", &self.options)
            .field("deployment_url", &self.deployment_url)
            .finish_non_exhaustive()
    }
}

impl<'a, R: CommandRunner + Send + Sync> VercelClient<'a, R> {
    /// Create a client and export the project ids for the CLI
    pub fn new(
        settings: &'a Settings,
        runner: R,
        options: VercelOptions,
        files: &ActionFiles,
    ) -> Result<Self> {
        tracing::info!("Setting environment variables for Vercel CLI");
        files.export_variable("VERCEL_ORG_ID", &settings.vercel_org_id)?;
        files.export_variable("VERCEL_PROJECT_ID", &settings.vercel_project_id)?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("vercel-deploy/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            settings,
            runner,
            http,
            envs: vec![
                ("VERCEL_ORG_ID".to_string(), settings.vercel_org_id.clone()),
                (
                    "VERCEL_PROJECT_ID".to_string(),
                    settings.vercel_project_id.clone(),
                ),
            ],
            options: VercelOptions {
                api_url: options.api_url.trim_end_matches('/').to_string(),
                ..options
            },
            deployment_url: None,
        })
    }

    /// URL of the deployment made by this client, without schema
    pub fn deployment_url(&self) -> Option<&str> {
        self.deployment_url.as_deref()
    }

    fn command(&self, args: Vec<String>) -> CommandLine {
        CommandLine::new(&self.options.vercel_bin)
            .args(args)
            .cwd(self.settings.working_directory.as_deref())
            .envs(&self.envs)
    }

    fn require_deployment_url(&self, operation: &str) -> Result<&str> {
        self.deployment_url.as_deref().ok_or_else(|| {
            Error::Precondition(format!(
                "Cannot {} before a deployment has been made",
                operation
            ))
        })
    }

    async fn fetch_deployment(&self, url: &str) -> Result<VercelDeployment> {
        let endpoint = format!("{}/v13/deployments/{}", self.options.api_url, url);
        let response = self
            .http
            .get(&endpoint)
            .bearer_auth(self.settings.vercel_token.expose())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!(
                "Vercel API returned {}: {}",
                status,
                api_error_message(&body)
            )));
        }

        Ok(response.json().await?)
    }
}

impl<R: CommandRunner + Send + Sync> DeployPlatform for VercelClient<'_, R> {
    async fn deploy(&mut self, commit: Option<&Commit>) -> Result<String> {
        let command = self.command(deploy_args(self.settings, commit));

        tracing::info!("Starting deploy with Vercel CLI");
        let output = self.runner.run(&command).await?;
        let url = parse_deployment_url(&output)?;

        self.deployment_url = Some(url.clone());
        Ok(url)
    }

    async fn assign_alias(&mut self, alias: &str) -> Result<String> {
        let url = self.require_deployment_url("assign an alias")?;
        let command = self.command(alias_args(self.settings, url, alias));

        tracing::info!("Assigning alias {} to {}", alias, url);
        self.runner.run(&command).await
    }

    async fn get_deployment(&mut self) -> Result<VercelDeployment> {
        let url = self.require_deployment_url("look up the deployment")?;

        if self.options.skip_lookup {
            tracing::debug!("Deployment lookup disabled, using {}", url);
            return Ok(VercelDeployment::from_url(url));
        }

        self.fetch_deployment(url).await
    }
}

/// Pull `error.message` out of a Vercel error body, else the raw body
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
