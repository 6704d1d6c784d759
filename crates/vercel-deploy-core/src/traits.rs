//! Client traits at the seams of the deploy pipeline
//!
//! The pipeline is generic over these, so tests swap in fakes without
//! boxing or dynamic dispatch.

use crate::error::Result;
use crate::types::{
    Comment, Commit, DeploymentState, DeploymentStatus, GitHubDeployment, Label, VercelDeployment,
};
use std::future::Future;

/// Source-control side: deployment records, comments, labels, commits
pub trait SourceControl {
    /// Create a deployment record and remember its id
    fn create_deployment(&mut self) -> impl Future<Output = Result<GitHubDeployment>> + Send;

    /// Post a status for the remembered deployment
    ///
    /// Resolves to `None` when no deployment was created.
    fn update_deployment(
        &mut self,
        state: DeploymentState,
        environment_url: Option<&str>,
    ) -> impl Future<Output = Result<Option<DeploymentStatus>>> + Send;

    /// Delete the previous deployment comment, returning its id
    fn delete_existing_comment(&mut self) -> impl Future<Output = Result<Option<u64>>> + Send;

    /// Post a pull request comment
    fn create_comment(&mut self, body: &str) -> impl Future<Output = Result<Comment>> + Send;

    /// Apply the configured labels to the pull request
    fn add_labels(&mut self) -> impl Future<Output = Result<Vec<Label>>> + Send;

    /// Fetch the commit being deployed
    fn get_commit(&mut self) -> impl Future<Output = Result<Commit>> + Send;
}

/// Deployment platform side
pub trait DeployPlatform {
    /// Deploy and return the deployment URL without schema
    fn deploy(&mut self, commit: Option<&Commit>) -> impl Future<Output = Result<String>> + Send;

    /// Point an alias domain at the current deployment
    fn assign_alias(&mut self, alias: &str) -> impl Future<Output = Result<String>> + Send;

    /// Fetch details of the current deployment
    fn get_deployment(&mut self) -> impl Future<Output = Result<VercelDeployment>> + Send;
}
