//! Request and response bodies for the GitHub REST API

use crate::types::DeploymentState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct CreateDeploymentRequest<'a> {
    #[serde(rename = "ref")]
    pub git_ref: &'a str,
    pub required_contexts: &'a [&'a str],
    pub environment: &'a str,
    pub description: &'a str,
    pub auto_merge: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeploymentStatusRequest<'a> {
    pub state: DeploymentState,
    pub log_url: &'a str,
    pub environment_url: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CommentRequest<'a> {
    pub body: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct LabelsRequest<'a> {
    pub labels: &'a [String],
}

#[derive(Debug, Deserialize)]
pub(crate) struct GitHubCommitResponse {
    pub commit: CommitData,
    /// Linked GitHub account, absent when the email is not tied to one
    #[serde(default)]
    pub author: Option<AccountData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitData {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: Option<GitAuthorData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GitAuthorData {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountData {
    #[serde(default)]
    pub login: Option<String>,
}
