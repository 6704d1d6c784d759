//! Action configuration
//!
//! [`Settings`] is built once at startup from the named inputs and the
//! triggering event, then passed by reference to every component.

pub mod context;
pub mod inputs;

pub use context::{EventContext, RunContext};
pub use inputs::{ArrayOptions, Inputs, ProcessEnv, VarSource};

use crate::error::{Error, Result};

/// Default label applied to deployed pull requests
pub const DEFAULT_PR_LABEL: &str = "deployed";

/// A credential that never shows up in `Debug` output
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a credential
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw credential
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Immutable run configuration
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// GitHub token (`GH_PAT`, else `GITHUB_TOKEN`)
    pub github_token: Secret,
    /// Vercel token
    pub vercel_token: Secret,

    /// Vercel team or user id
    pub vercel_org_id: String,
    /// Vercel project id
    pub vercel_project_id: String,
    /// `owner/name` of the repository
    pub github_repository: String,
    /// Vercel scope passed to every CLI call
    pub vercel_scope: Option<String>,
    /// Custom Vercel environment (`--target`)
    pub vercel_target: Option<String>,
    /// GitHub environment name override
    pub github_deployment_env: Option<String>,
    /// Directory the Vercel CLI runs in
    pub working_directory: Option<String>,
    /// Alias template for pull request previews
    pub pr_preview_domain: Option<String>,

    /// Deploy to production
    pub production: bool,
    /// Deploy a prebuilt output
    pub prebuilt: bool,
    /// Skip the build cache
    pub force: bool,

    /// Keep a GitHub deployment record in sync
    pub github_deployment: bool,
    /// Comment on pull requests
    pub create_comment: bool,
    /// Replace the previous deployment comment
    pub delete_existing_comment: bool,
    /// Send commit details as deployment metadata
    pub attach_commit_metadata: bool,
    /// Deploy pull requests opened from forks
    pub deploy_pr_from_fork: bool,
    /// Only send the first line of the commit message
    pub trim_commit_message: bool,

    /// Labels added to deployed pull requests
    pub pr_labels: Vec<String>,
    /// Alias templates for non-PR deployments
    pub alias_domains: Vec<String>,
    /// `KEY=value` build environment entries
    pub build_env: Vec<String>,

    /// Run outside GitHub Actions, taking context from plain env vars
    pub running_local: bool,

    /// Derived run context
    pub run: RunContext,
}

impl Settings {
    /// Load settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::load(&ProcessEnv)
    }

    /// Load settings from inputs and derive the run context
    pub fn load(vars: &dyn VarSource) -> Result<Self> {
        let inputs = Inputs::new(vars);
        let running_local = vars
            .var("RUNNING_LOCAL")
            .map(|v| v == "true")
            .unwrap_or(false);
        let event = if running_local {
            EventContext::default()
        } else {
            EventContext::from_vars(vars)
        };

        let github_repository = inputs.required_string(&["GITHUB_REPOSITORY"])?;
        validate_repository(&github_repository)?;

        let mut settings = Self {
            github_token: Secret::new(inputs.required_string(&["GH_PAT", "GITHUB_TOKEN"])?),
            vercel_token: Secret::new(inputs.required_string(&["VERCEL_TOKEN"])?),
            vercel_org_id: inputs.required_string(&["VERCEL_ORG_ID"])?,
            vercel_project_id: inputs.required_string(&["VERCEL_PROJECT_ID"])?,
            vercel_scope: inputs.string(&["VERCEL_SCOPE"]),
            vercel_target: inputs.string(&["VERCEL_TARGET"]),
            github_deployment_env: inputs.string(&["GITHUB_DEPLOYMENT_ENV"]),
            working_directory: inputs.string(&["WORKING_DIRECTORY"]),
            pr_preview_domain: inputs.string(&["PR_PREVIEW_DOMAIN"]),
            production: inputs.boolean("PRODUCTION", !event.is_pull_request())?,
            prebuilt: inputs.boolean("PREBUILT", false)?,
            force: inputs.boolean("FORCE", false)?,
            github_deployment: inputs.boolean("GITHUB_DEPLOYMENT", true)?,
            create_comment: inputs.boolean("CREATE_COMMENT", true)?,
            delete_existing_comment: inputs.boolean("DELETE_EXISTING_COMMENT", true)?,
            attach_commit_metadata: inputs.boolean("ATTACH_COMMIT_METADATA", true)?,
            deploy_pr_from_fork: inputs.boolean("DEPLOY_PR_FROM_FORK", false)?,
            trim_commit_message: inputs.boolean("TRIM_COMMIT_MESSAGE", false)?,
            pr_labels: inputs.array(
                "PR_LABELS",
                ArrayOptions {
                    default: &[DEFAULT_PR_LABEL],
                    disableable: true,
                },
            ),
            alias_domains: inputs.array(
                "ALIAS_DOMAINS",
                ArrayOptions {
                    default: &[],
                    disableable: true,
                },
            ),
            build_env: inputs.array("BUILD_ENV", ArrayOptions::default()),
            running_local,
            github_repository,
            run: RunContext::default(),
        };

        if running_local {
            let (run, overrides) = context::derive_local(&settings.github_repository, vars);
            settings.run = run;
            settings.production = overrides.production;
            settings.trim_commit_message = overrides.trim_commit_message;
        } else {
            settings.run = context::derive_hosted(&settings.github_repository, &event);
        }

        tracing::debug!("Loaded settings: {:#?}", settings);
        Ok(settings)
    }

    /// GitHub environment name for the deployment record
    pub fn deployment_environment(&self) -> &str {
        match self.github_deployment_env.as_deref() {
            Some(env) => env,
            None if self.production => "Production",
            None => "Preview",
        }
    }

    /// Both credentials, for masking in the job log
    pub fn secrets(&self) -> [&str; 2] {
        [self.github_token.expose(), self.vercel_token.expose()]
    }
}

fn validate_repository(full_name: &str) -> Result<()> {
    match full_name.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok(())
        }
        _ => Err(Error::Config(format!(
            "Invalid GITHUB_REPOSITORY format: {} (expected owner/name)",
            full_name
        ))),
    }
}
