//! GitHub REST API client for deployments, comments and labels

use super::models::{
    CommentRequest, CreateDeploymentRequest, DeploymentStatusRequest, GitHubCommitResponse,
    LabelsRequest,
};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::traits::SourceControl;
use crate::types::{
    Comment, Commit, DeploymentState, DeploymentStatus, GitHubDeployment, Label,
};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Default GitHub API endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Sentence that marks comments written by this action
pub const COMMENT_MARKER: &str = "This pull request has been deployed to Vercel.";

/// Page size for listing comments
const PER_PAGE: u32 = 100;

/// Safety limit on comment pages
const MAX_PAGES: u32 = 100;

/// GitHub API client bound to one repository
pub struct GitHubClient<'a> {
    client: reqwest::Client,
    base_url: String,
    settings: &'a Settings,
    deployment_id: Option<u64>,
}

impl std::fmt::Debug for GitHubClient<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("base_url", &self.base_url)
            .field("repository", &self.settings.github_repository)
            .field("deployment_id", &self.deployment_id)
            .finish_non_exhaustive()
    }
}

impl<'a> GitHubClient<'a> {
    /// Create a client for the configured repository
    pub fn new(settings: &'a Settings, base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("vercel-deploy/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            settings,
            deployment_id: None,
        })
    }

    /// Id of the deployment record created by this run
    pub fn deployment_id(&self) -> Option<u64> {
        self.deployment_id
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.base_url, self.settings.run.user, self.settings.run.repository, path
        )
    }

    /// Commit URL with the ref encoded as a single path segment
    fn commit_url(&self, git_ref: &str) -> Result<Url> {
        let base = self.repo_url("/commits");
        let mut url = Url::parse(&base)
            .map_err(|e| Error::Config(format!("Invalid GitHub API URL {}: {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Invalid GitHub API URL {}", base)))?
            .push(git_ref);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(self.settings.github_token.expose())
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    fn require_pr_number(&self, operation: &str) -> Result<u64> {
        self.settings.run.pr_number.ok_or_else(|| {
            Error::Precondition(format!("PR_NUMBER is required for {} operations", operation))
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = check(self.authorized(request).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn list_comments(&self, pr_number: u64) -> Result<Vec<Comment>> {
        let mut url = self.repo_url(&format!(
            "/issues/{}/comments?per_page={}",
            pr_number, PER_PAGE
        ));
        let mut comments = Vec::new();

        for _ in 0..MAX_PAGES {
            let response = check(self.authorized(self.client.get(&url)).send().await?).await?;
            let next = next_page_url(&response);
            let page: Vec<Comment> = response.json().await?;
            comments.extend(page);

            match next {
                Some(next) => url = next,
                None => return Ok(comments),
            }
        }

        Err(Error::Api("Too many pages in GitHub API response".to_string()))
    }

    async fn create_deployment_inner(&mut self) -> Result<GitHubDeployment> {
        let body = CreateDeploymentRequest {
            git_ref: &self.settings.run.git_ref,
            required_contexts: &[],
            environment: self.settings.deployment_environment(),
            description: "Deploy to Vercel",
            auto_merge: false,
        };

        let value: Value = self
            .send_json(self.client.post(self.repo_url("/deployments")).json(&body))
            .await?;

        // 202 responses carry a message instead of a deployment
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            return Err(Error::Api(format!("GitHub API error: {}", message)));
        }

        let deployment: GitHubDeployment = serde_json::from_value(value)?;
        self.deployment_id = Some(deployment.id);
        tracing::info!("Created GitHub deployment #{}", deployment.id);
        Ok(deployment)
    }

    async fn update_deployment_inner(
        &self,
        id: u64,
        state: DeploymentState,
        environment_url: Option<&str>,
    ) -> Result<DeploymentStatus> {
        let description = format!("Deployment {} on Vercel", state);
        let body = DeploymentStatusRequest {
            state,
            log_url: &self.settings.run.log_url,
            environment_url: environment_url.unwrap_or(&self.settings.run.log_url),
            description: &description,
        };

        let status: DeploymentStatus = self
            .send_json(
                self.client
                    .post(self.repo_url(&format!("/deployments/{}/statuses", id)))
                    .json(&body),
            )
            .await?;

        if state.is_terminal() {
            tracing::info!("Deployment #{} finished with \"{}\"", id, state);
        } else {
            tracing::debug!("Deployment #{} status set to \"{}\"", id, state);
        }
        Ok(status)
    }

    async fn delete_existing_comment_inner(&self) -> Result<Option<u64>> {
        let pr_number = self.require_pr_number("comment")?;
        let comments = self.list_comments(pr_number).await?;

        let Some(comment) = comments.into_iter().find(|c| {
            c.body
                .as_deref()
                .is_some_and(|body| body.contains(COMMENT_MARKER))
        }) else {
            return Ok(None);
        };

        let url = self.repo_url(&format!("/issues/comments/{}", comment.id));
        check(self.authorized(self.client.delete(url)).send().await?).await?;

        tracing::info!("Deleted existing comment #{}", comment.id);
        Ok(Some(comment.id))
    }

    async fn create_comment_inner(&self, body: &str) -> Result<Comment> {
        let pr_number = self.require_pr_number("comment")?;
        let body = dedent(body);

        let comment: Comment = self
            .send_json(
                self.client
                    .post(self.repo_url(&format!("/issues/{}/comments", pr_number)))
                    .json(&CommentRequest { body: &body }),
            )
            .await?;

        tracing::info!("Created comment #{}", comment.id);
        Ok(comment)
    }

    async fn add_labels_inner(&self) -> Result<Vec<Label>> {
        let pr_number = self.require_pr_number("label")?;

        let labels: Vec<Label> = self
            .send_json(
                self.client
                    .post(self.repo_url(&format!("/issues/{}/labels", pr_number)))
                    .json(&LabelsRequest {
                        labels: &self.settings.pr_labels,
                    }),
            )
            .await?;

        let names: Vec<&str> = labels.iter().map(|l| l.name.as_str()).collect();
        tracing::info!("Added labels: {}", names.join(", "));
        Ok(labels)
    }

    async fn get_commit_inner(&self) -> Result<Commit> {
        let url = self.commit_url(&self.settings.run.git_ref)?;
        let data: GitHubCommitResponse = self.send_json(self.client.get(url)).await?;

        Ok(Commit {
            author_name: data
                .commit
                .author
                .and_then(|a| a.name)
                .unwrap_or_default(),
            author_login: data.author.and_then(|a| a.login).unwrap_or_default(),
            message: data.commit.message,
        })
    }
}

impl SourceControl for GitHubClient<'_> {
    async fn create_deployment(&mut self) -> Result<GitHubDeployment> {
        self.create_deployment_inner()
            .await
            .inspect_err(|e| tracing::error!("Failed to create GitHub deployment: {}", e))
    }

    async fn update_deployment(
        &mut self,
        state: DeploymentState,
        environment_url: Option<&str>,
    ) -> Result<Option<DeploymentStatus>> {
        let Some(id) = self.deployment_id else {
            tracing::warn!("No deployment ID available for status update");
            return Ok(None);
        };

        self.update_deployment_inner(id, state, environment_url)
            .await
            .map(Some)
            .inspect_err(|e| tracing::error!("Failed to update deployment status: {}", e))
    }

    async fn delete_existing_comment(&mut self) -> Result<Option<u64>> {
        self.delete_existing_comment_inner()
            .await
            .inspect_err(|e| tracing::error!("Failed to delete existing comment: {}", e))
    }

    async fn create_comment(&mut self, body: &str) -> Result<Comment> {
        self.create_comment_inner(body)
            .await
            .inspect_err(|e| tracing::error!("Failed to create comment: {}", e))
    }

    async fn add_labels(&mut self) -> Result<Vec<Label>> {
        self.add_labels_inner()
            .await
            .inspect_err(|e| tracing::error!("Failed to add labels: {}", e))
    }

    async fn get_commit(&mut self) -> Result<Commit> {
        self.get_commit_inner()
            .await
            .inspect_err(|e| tracing::error!("Failed to get commit: {}", e))
    }
}

/// Turn a non-2xx response into an error carrying GitHub's message
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let remaining = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if matches!(status, StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS)
        && remaining.as_deref() == Some("0")
    {
        return Err(Error::RateLimitExceeded(format!(
            "GitHub API rate limit exceeded ({})",
            status
        )));
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);

    Err(Error::Api(format!(
        "GitHub API returned {}: {}",
        status,
        message.trim()
    )))
}

/// Extract the `rel="next"` target from a `Link` header
fn next_page_url(response: &Response) -> Option<String> {
    let link = response.headers().get("Link")?.to_str().ok()?;
    parse_next_link(link)
}

fn parse_next_link(link: &str) -> Option<String> {
    link.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        if !params.contains("rel=\"next\"") {
            return None;
        }
        Some(
            target
                .trim()
                .trim_start_matches('<')
                .trim_end_matches('>')
                .to_string(),
        )
    })
}

/// Strip leading non-newline whitespace from every line
pub fn dedent(body: &str) -> String {
    body.split('\n')
        .map(|line| line.trim_start_matches(|c: char| c.is_whitespace() && c != '\n'))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedent() {
        let body = "\n\t\t\tFirst line\n\t\t\t  Second\n\n    Third\t\n";
        assert_eq!(dedent(body), "\nFirst line\nSecond\n\nThird\t\n");
    }

    #[test]
    fn test_parse_next_link() {
        let link = r#"<https://api.github.com/repositories/1/issues/2/comments?page=2>; rel="next", <https://api.github.com/repositories/1/issues/2/comments?page=5>; rel="last""#;
        assert_eq!(
            parse_next_link(link).as_deref(),
            Some("https://api.github.com/repositories/1/issues/2/comments?page=2")
        );

        let last_page = r#"<https://api.github.com/x?page=1>; rel="prev""#;
        assert_eq!(parse_next_link(last_page), None);
    }

    #[test]
    fn test_client_debug_hides_token() {
        let settings = Settings {
            github_token: crate::config::Secret::new("ghs_topsecret"),
            ..Default::default()
        };
        let client = GitHubClient::new(&settings, DEFAULT_API_URL).unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("ghs_topsecret"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let settings = Settings::default();
        let client = GitHubClient::new(&settings, "http://localhost:8080/").unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
    }
}
