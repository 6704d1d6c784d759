//! Deploy pipeline: GitHub deployment record, Vercel deploy, aliases, PR feedback

use super::comment::{deployment_summary, fork_refusal};
use crate::alias::{add_schema, generate_unique_alias, render_template, TemplateKind};
use crate::config::Settings;
use crate::error::Result;
use crate::traits::{DeployPlatform, SourceControl};
use crate::types::{ActionOutputs, DeploymentState};

/// Runs one deployment from start to finish
///
/// The platform client is built through a factory so that nothing touches
/// Vercel until the GitHub deployment record is pending.
pub struct DeployPipeline<'a, S> {
    settings: &'a Settings,
    scm: S,
}

impl<'a, S: SourceControl> DeployPipeline<'a, S> {
    /// Create a pipeline around a source-control client
    pub fn new(settings: &'a Settings, scm: S) -> Self {
        Self { settings, scm }
    }

    /// Run the pipeline
    ///
    /// Any failure after the deployment record is pending moves it to
    /// `failure` before the original error is returned.
    pub async fn run<P, F>(&mut self, platform: F) -> Result<ActionOutputs>
    where
        P: DeployPlatform,
        F: FnOnce() -> Result<P>,
    {
        let settings = self.settings;

        // Step 1: Refuse untrusted forks
        if settings.run.is_fork && !settings.deploy_pr_from_fork {
            tracing::warn!("PR is from fork and DEPLOY_PR_FROM_FORK is set to false");
            let comment = self.scm.create_comment(&fork_refusal(&settings.run)).await?;
            tracing::info!("Comment created: {}", comment.html_url);
            return Ok(ActionOutputs::fork_refused());
        }

        // Step 2: Open the GitHub deployment record
        if settings.github_deployment {
            tracing::info!("Creating GitHub deployment");
            let deployment = self.scm.create_deployment().await?;
            tracing::info!("Deployment #{} created", deployment.id);

            self.scm
                .update_deployment(DeploymentState::Pending, None)
                .await?;
            tracing::info!(
                "Deployment #{} status changed to \"{}\"",
                deployment.id,
                DeploymentState::Pending
            );
        }

        let result = self.deploy(platform).await;

        if result.is_err() && settings.github_deployment {
            if let Err(update_err) = self
                .scm
                .update_deployment(DeploymentState::Failure, None)
                .await
            {
                tracing::warn!("Failed to update deployment status: {}", update_err);
            }
        }

        result
    }

    async fn deploy<P, F>(&mut self, platform: F) -> Result<ActionOutputs>
    where
        P: DeployPlatform,
        F: FnOnce() -> Result<P>,
    {
        let settings = self.settings;
        let run = &settings.run;

        // Step 3: Deploy with the Vercel CLI
        tracing::info!("Creating deployment with Vercel CLI");
        let mut vercel = platform()?;

        let commit = if settings.attach_commit_metadata {
            Some(self.scm.get_commit().await?)
        } else {
            None
        };

        let deployment_url = vercel.deploy(commit.as_ref()).await?;
        tracing::info!("Successfully deployed to Vercel!");

        // Step 4: Resolve aliases, preview domain first
        let mut urls = Vec::new();

        if run.is_pr {
            if let Some(ref domain) = settings.pr_preview_domain {
                tracing::info!("Assigning custom preview domain to PR");
                let alias = render_template(domain, run, TemplateKind::PullRequest);
                let alias = generate_unique_alias(&alias, &run.branch, &run.repository);
                vercel.assign_alias(&alias).await?;
                urls.push(add_schema(&alias));
            }
        } else if !settings.alias_domains.is_empty() {
            tracing::info!("Assigning custom domains to Vercel deployment");
            for domain in settings.alias_domains.iter().filter(|d| !d.is_empty()) {
                let alias = render_template(domain, run, TemplateKind::Production);
                vercel.assign_alias(&alias).await?;
                urls.push(add_schema(&alias));
            }
        }

        urls.push(add_schema(&deployment_url));
        let preview_url = urls[0].clone();

        // Step 5: Fetch deployment details
        let deployment = vercel.get_deployment().await?;
        tracing::info!(
            "Deployment \"{}\" available at: {}",
            deployment.id,
            urls.join(", ")
        );

        // Step 6: Close the GitHub deployment record
        if settings.github_deployment {
            tracing::info!("Changing GitHub deployment status to \"success\"");
            self.scm
                .update_deployment(DeploymentState::Success, Some(&preview_url))
                .await?;
        }

        // Step 7: Pull request feedback
        if run.is_pr {
            if settings.delete_existing_comment {
                tracing::info!("Checking for existing comment on PR");
                if let Some(id) = self.scm.delete_existing_comment().await? {
                    tracing::info!("Deleted existing comment #{}", id);
                }
            }

            if settings.create_comment {
                tracing::info!("Creating new comment on PR");
                let body = deployment_summary(run, &preview_url, &deployment.inspector_url);
                let comment = self.scm.create_comment(&body).await?;
                tracing::info!("Comment created: {}", comment.html_url);
            }

            if !settings.pr_labels.is_empty() {
                tracing::info!("Adding label(s) to PR");
                let labels = self.scm.add_labels().await?;
                let names: Vec<&str> = labels.iter().map(|l| l.name.as_str()).collect();
                tracing::info!("Label(s) \"{}\" added", names.join(", "));
            }
        }

        Ok(ActionOutputs {
            preview_url: Some(preview_url),
            deployment_unique_url: urls.last().cloned(),
            deployment_urls: urls,
            deployment_id: Some(deployment.id),
            deployment_inspector_url: Some(deployment.inspector_url),
            deployment_created: true,
            comment_created: run.is_pr && settings.create_comment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunContext;
    use crate::error::Error;
    use crate::types::{
        Comment, Commit, DeploymentStatus, GitHubDeployment, Label, VercelDeployment,
    };
    use assert_matches::assert_matches;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<String>>>;

    fn record(log: &Log, entry: impl Into<String>) {
        log.lock().unwrap().push(entry.into());
    }

    struct FakeScm {
        log: Log,
        deployment_id: Option<u64>,
    }

    impl SourceControl for FakeScm {
        async fn create_deployment(&mut self) -> Result<GitHubDeployment> {
            record(&self.log, "create_deployment");
            self.deployment_id = Some(7);
            Ok(GitHubDeployment { id: 7 })
        }

        async fn update_deployment(
            &mut self,
            state: DeploymentState,
            environment_url: Option<&str>,
        ) -> Result<Option<DeploymentStatus>> {
            let Some(id) = self.deployment_id else {
                return Ok(None);
            };
            match environment_url {
                Some(url) => record(&self.log, format!("status:{}:{}", state, url)),
                None => record(&self.log, format!("status:{}", state)),
            }
            Ok(Some(DeploymentStatus {
                id,
                state: state.to_string(),
            }))
        }

        async fn delete_existing_comment(&mut self) -> Result<Option<u64>> {
            record(&self.log, "delete_comment");
            Ok(Some(3))
        }

        async fn create_comment(&mut self, body: &str) -> Result<Comment> {
            record(&self.log, format!("comment:{}", body));
            Ok(Comment {
                id: 4,
                html_url: "https://github.com/acme/widgets/pull/9#issuecomment-4".into(),
                body: Some(body.to_string()),
            })
        }

        async fn add_labels(&mut self) -> Result<Vec<Label>> {
            record(&self.log, "labels");
            Ok(vec![Label {
                name: "deployed".into(),
            }])
        }

        async fn get_commit(&mut self) -> Result<Commit> {
            record(&self.log, "get_commit");
            Ok(Commit {
                author_name: "Jane".into(),
                author_login: "jane".into(),
                message: "fix".into(),
            })
        }
    }

    struct FakeVercel {
        log: Log,
        fail_deploy: bool,
        url: Option<String>,
    }

    impl DeployPlatform for FakeVercel {
        async fn deploy(&mut self, commit: Option<&Commit>) -> Result<String> {
            record(&self.log, format!("deploy:{}", commit.is_some()));
            if self.fail_deploy {
                return Err(Error::Process("Error: build failed".into()));
            }
            self.url = Some("widgets-abc123.vercel.app".into());
            Ok("widgets-abc123.vercel.app".into())
        }

        async fn assign_alias(&mut self, alias: &str) -> Result<String> {
            record(&self.log, format!("alias:{}", alias));
            Ok(String::new())
        }

        async fn get_deployment(&mut self) -> Result<VercelDeployment> {
            record(&self.log, "get_deployment");
            Ok(VercelDeployment {
                id: "dpl_1".into(),
                inspector_url: "https://vercel.com/acme/widgets/1".into(),
                url: self.url.clone().unwrap_or_default(),
            })
        }
    }

    fn base_settings() -> Settings {
        Settings {
            github_repository: "acme/widgets".into(),
            github_deployment: true,
            create_comment: true,
            delete_existing_comment: true,
            attach_commit_metadata: true,
            pr_labels: vec!["deployed".into()],
            run: RunContext {
                user: "acme".into(),
                repository: "widgets".into(),
                sha: "abc1234def5678".into(),
                git_ref: "refs/heads/main".into(),
                branch: "main".into(),
                log_url: "https://github.com/acme/widgets/actions/runs/1".into(),
                actor: "jane".into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn pr_settings() -> Settings {
        let mut s = base_settings();
        s.run.is_pr = true;
        s.run.pr_number = Some(9);
        s.run.branch = "feature/Login".into();
        s.run.git_ref = "feature/Login".into();
        s
    }

    async fn run_pipeline(settings: &Settings, fail_deploy: bool) -> (Result<ActionOutputs>, Vec<String>) {
        let log = Log::default();
        let scm = FakeScm {
            log: log.clone(),
            deployment_id: None,
        };
        let vercel_log = log.clone();
        let mut pipeline = DeployPipeline::new(settings, scm);
        let result = pipeline
            .run(move || {
                Ok(FakeVercel {
                    log: vercel_log,
                    fail_deploy,
                    url: None,
                })
            })
            .await;
        let entries = log.lock().unwrap().clone();
        (result, entries)
    }

    #[tokio::test]
    async fn test_production_with_alias_domains() {
        let mut settings = base_settings();
        settings.alias_domains = vec!["www.{REPO}.example.com".into()];

        let (result, log) = run_pipeline(&settings, false).await;
        let outputs = result.unwrap();

        assert_eq!(
            outputs.deployment_urls,
            vec![
                "https://www.widgets.example.com",
                "https://widgets-abc123.vercel.app"
            ]
        );
        assert_eq!(outputs.preview_url.as_deref(), Some("https://www.widgets.example.com"));
        assert_eq!(
            outputs.deployment_unique_url.as_deref(),
            Some("https://widgets-abc123.vercel.app")
        );
        assert_eq!(outputs.deployment_id.as_deref(), Some("dpl_1"));
        assert!(outputs.deployment_created);
        assert!(!outputs.comment_created);

        assert_eq!(
            log,
            vec![
                "create_deployment",
                "status:pending",
                "get_commit",
                "deploy:true",
                "alias:www.widgets.example.com",
                "get_deployment",
                "status:success:https://www.widgets.example.com",
            ]
        );
    }

    #[tokio::test]
    async fn test_fork_refused() {
        let mut settings = pr_settings();
        settings.run.is_fork = true;
        settings.run.actor = "mallory".into();

        let (result, log) = run_pipeline(&settings, false).await;

        assert_eq!(result.unwrap(), ActionOutputs::fork_refused());
        assert_eq!(log.len(), 1);
        assert!(log[0].starts_with("comment:"));
        assert!(log[0].contains("@mallory's fork"));
    }

    #[tokio::test]
    async fn test_fork_allowed_deploys() {
        let mut settings = pr_settings();
        settings.run.is_fork = true;
        settings.deploy_pr_from_fork = true;

        let (result, log) = run_pipeline(&settings, false).await;

        assert!(result.unwrap().deployment_created);
        assert!(log.iter().any(|e| e == "deploy:true"));
    }

    #[tokio::test]
    async fn test_pr_deploy_failure_marks_record_failed() {
        let settings = pr_settings();

        let (result, log) = run_pipeline(&settings, true).await;

        assert_matches!(result, Err(Error::Process(ref msg)) if msg == "Error: build failed");
        assert_eq!(
            log,
            vec![
                "create_deployment",
                "status:pending",
                "get_commit",
                "deploy:true",
                "status:failure",
            ]
        );
    }

    #[tokio::test]
    async fn test_pr_with_preview_domain() {
        let mut settings = pr_settings();
        settings.pr_preview_domain = Some("{BRANCH}-pr{PR}-{USER}.example.com".into());

        let (result, log) = run_pipeline(&settings, false).await;
        let outputs = result.unwrap();

        assert_eq!(
            outputs.deployment_urls,
            vec![
                "https://feature-login-pr9-acme.example.com",
                "https://widgets-abc123.vercel.app"
            ]
        );
        assert!(outputs.comment_created);
        assert!(log.contains(&"alias:feature-login-pr9-acme.example.com".to_string()));

        let tail: Vec<&str> = log
            .iter()
            .skip_while(|e| !e.starts_with("status:success"))
            .map(|e| e.split(':').next().unwrap_or(""))
            .collect();
        assert_eq!(tail, vec!["status", "delete_comment", "comment", "labels"]);
    }

    #[tokio::test]
    async fn test_pr_ignores_production_aliases() {
        let mut settings = pr_settings();
        settings.alias_domains = vec!["www.example.com".into()];

        let (result, log) = run_pipeline(&settings, false).await;

        assert_eq!(
            result.unwrap().deployment_urls,
            vec!["https://widgets-abc123.vercel.app"]
        );
        assert!(!log.iter().any(|e| e.starts_with("alias:")));
    }

    #[tokio::test]
    async fn test_pr_without_labels_or_comments() {
        let mut settings = pr_settings();
        settings.pr_labels.clear();
        settings.create_comment = false;
        settings.delete_existing_comment = false;

        let (result, log) = run_pipeline(&settings, false).await;

        assert!(!result.unwrap().comment_created);
        assert!(!log.iter().any(|e| e == "labels" || e.starts_with("comment")));
    }

    #[tokio::test]
    async fn test_without_github_deployment_or_metadata() {
        let mut settings = base_settings();
        settings.github_deployment = false;
        settings.attach_commit_metadata = false;

        let (result, log) = run_pipeline(&settings, true).await;

        assert!(result.is_err());
        assert_eq!(log, vec!["deploy:false"]);
    }

    #[tokio::test]
    async fn test_platform_setup_failure_marks_record_failed() {
        let settings = base_settings();
        let log = Log::default();
        let scm = FakeScm {
            log: log.clone(),
            deployment_id: None,
        };
        let mut pipeline = DeployPipeline::new(&settings, scm);

        let result = pipeline
            .run(|| -> Result<FakeVercel> { Err(Error::Config("GITHUB_ENV unwritable".into())) })
            .await;

        assert_matches!(result, Err(Error::Config(_)));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["create_deployment", "status:pending", "status:failure"]
        );
    }
}
