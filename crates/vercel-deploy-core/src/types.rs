//! Core type definitions shared by the clients and the pipeline

use serde::{Deserialize, Serialize};

/// Commit metadata attached to a Vercel deployment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Commit {
    /// Display name from the commit's author metadata
    pub author_name: String,
    /// GitHub login of the linked account
    pub author_login: String,
    /// Full commit message
    pub message: String,
}

impl Commit {
    /// First line of the commit message (handles `\r\n`)
    pub fn first_line(&self) -> &str {
        self.message
            .split('\n')
            .next()
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .unwrap_or("")
    }
}

/// GitHub deployment status state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum DeploymentState {
    /// Deployment errored
    Error,
    /// Deployment failed
    Failure,
    /// Superseded deployment
    Inactive,
    /// Deployment running
    InProgress,
    /// Deployment queued
    Queued,
    /// Deployment created, not yet finished
    Pending,
    /// Deployment succeeded
    Success,
}

impl DeploymentState {
    /// Get string representation
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Failure => "failure",
            Self::Inactive => "inactive",
            Self::InProgress => "in_progress",
            Self::Queued => "queued",
            Self::Pending => "pending",
            Self::Success => "success",
        }
    }

    /// Whether this state closes a deployment record
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failure | Self::Error)
    }
}

impl std::fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// GitHub deployment record
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitHubDeployment {
    /// Deployment id
    pub id: u64,
}

/// GitHub deployment status record
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeploymentStatus {
    /// Status id
    pub id: u64,
    /// Reported state
    pub state: String,
}

/// Pull request (issue) comment
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Comment {
    /// Comment id
    pub id: u64,
    /// Link to the rendered comment
    #[serde(default)]
    pub html_url: String,
    /// Markdown body
    #[serde(default)]
    pub body: Option<String>,
}

/// Pull request label
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Label {
    /// Label name
    pub name: String,
}

/// Vercel deployment details
///
/// The API returns far more than this; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VercelDeployment {
    /// Deployment id (`dpl_...`)
    #[serde(default)]
    pub id: String,
    /// Link to the Vercel dashboard inspector
    #[serde(default)]
    pub inspector_url: String,
    /// Deployment URL without schema
    #[serde(default)]
    pub url: String,
}

impl VercelDeployment {
    /// Offline record built from the parsed deployment URL
    pub fn from_url(url: &str) -> Self {
        Self {
            id: url.to_string(),
            inspector_url: String::new(),
            url: url.to_string(),
        }
    }
}

/// Values published as step outputs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionOutputs {
    /// First resolved URL
    pub preview_url: Option<String>,
    /// All resolved URLs, aliases first, raw deployment URL last
    pub deployment_urls: Vec<String>,
    /// Last entry of `deployment_urls`
    pub deployment_unique_url: Option<String>,
    /// Vercel deployment id
    pub deployment_id: Option<String>,
    /// Vercel inspector URL
    pub deployment_inspector_url: Option<String>,
    /// Whether a Vercel deployment was made
    pub deployment_created: bool,
    /// Whether a pull request comment was posted
    pub comment_created: bool,
}

impl ActionOutputs {
    /// Outputs for a run that refused to deploy a fork
    pub fn fork_refused() -> Self {
        Self {
            deployment_created: false,
            comment_created: true,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_first_line() {
        let commit = Commit {
            message: "feat: add thing\r\n\nlonger body".into(),
            ..Default::default()
        };
        assert_eq!(commit.first_line(), "feat: add thing");

        let commit = Commit::default();
        assert_eq!(commit.first_line(), "");
    }

    #[test]
    fn test_deployment_state_strings() {
        assert_eq!(DeploymentState::InProgress.as_str(), "in_progress");
        assert_eq!(DeploymentState::Pending.to_string(), "pending");
        assert_eq!(
            serde_json::to_string(&DeploymentState::InProgress).unwrap(),
            r#""in_progress""#
        );
        assert!(DeploymentState::Success.is_terminal());
        assert!(!DeploymentState::Pending.is_terminal());
    }

    #[test]
    fn test_vercel_deployment_ignores_extra_fields() {
        let json = r#"{"id":"dpl_123","inspectorUrl":"https://vercel.com/acme/widgets/abc","url":"widgets-abc.vercel.app","readyState":"READY"}"#;
        let d: VercelDeployment = serde_json::from_str(json).unwrap();
        assert_eq!(d.id, "dpl_123");
        assert_eq!(d.inspector_url, "https://vercel.com/acme/widgets/abc");
        assert_eq!(d.url, "widgets-abc.vercel.app");
    }

    #[test]
    fn test_fork_refused_outputs() {
        let out = ActionOutputs::fork_refused();
        assert!(!out.deployment_created);
        assert!(out.comment_created);
        assert!(out.deployment_urls.is_empty());
    }
}
