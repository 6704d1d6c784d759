//! # Vercel Deploy Core
//!
//! Deploys a repository to Vercel from a GitHub Actions run and reports
//! the result back to GitHub.
//!
//! A run:
//! - reads the action inputs into an immutable [`Settings`]
//! - opens a GitHub deployment record and marks it pending
//! - deploys through the Vercel CLI and assigns alias domains
//! - marks the record successful (or failed)
//! - comments on and labels the pull request
//!
//! ## Example
//!
//! ```no_run
//! use vercel_deploy_core::{deploy, ActionFiles, DeployOptions, Settings};
//!
//! # async fn example() -> vercel_deploy_core::Result<()> {
//! let settings = Settings::from_env()?;
//! let files = ActionFiles::from_env();
//!
//! let outputs = deploy(&settings, DeployOptions::default(), &files).await?;
//! files.write_outputs(&outputs)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, rust_2018_idioms)]

pub mod alias;
pub mod config;
pub mod coordination;
pub mod error;
pub mod exec;
pub mod github;
pub mod logging;
pub mod output;
pub mod traits;
pub mod types;
pub mod vercel;

pub use config::Settings;
pub use coordination::DeployPipeline;
pub use error::{Error, ErrorKind, Result};
pub use exec::{CommandLine, CommandRunner, ProcessRunner};
pub use github::GitHubClient;
pub use output::ActionFiles;
pub use traits::{DeployPlatform, SourceControl};
pub use types::{ActionOutputs, Commit, DeploymentState, VercelDeployment};
pub use vercel::{VercelClient, VercelOptions};

/// Endpoints and Vercel CLI options for [`deploy`]
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// GitHub REST API base URL
    pub github_api_url: String,
    /// Vercel CLI and API options
    pub vercel: VercelOptions,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            github_api_url: github::DEFAULT_API_URL.to_string(),
            vercel: VercelOptions::default(),
        }
    }
}

/// Run the full deploy pipeline against the real GitHub API and Vercel CLI
///
/// The Vercel client is only created once the GitHub deployment record is
/// pending, so project ids are exported to `files` at that point.
pub async fn deploy(
    settings: &Settings,
    options: DeployOptions,
    files: &ActionFiles,
) -> Result<ActionOutputs> {
    let github = GitHubClient::new(settings, options.github_api_url)?;
    let vercel = options.vercel;

    let mut pipeline = DeployPipeline::new(settings, github);
    pipeline
        .run(|| VercelClient::new(settings, ProcessRunner, vercel, files))
        .await
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_library_version() {
        let _ = env!("CARGO_PKG_VERSION");
    }
}
