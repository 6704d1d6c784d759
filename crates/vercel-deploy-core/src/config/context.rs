//! Run context derived from the triggering event or local overrides

use super::inputs::VarSource;
use serde_json::Value;
use std::path::Path;

/// Length of the `refs/heads/` prefix stripped from push refs
const HEADS_PREFIX_LEN: usize = 11;

/// Placeholder SHA for local runs
const LOCAL_SHA: &str = "XXXXXXX";

/// Values that depend on where and why the action runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    /// Repository owner
    pub user: String,
    /// Repository name
    pub repository: String,
    /// Commit SHA being deployed
    pub sha: String,
    /// Triggered by a pull request event
    pub is_pr: bool,
    /// Pull request number, if any
    pub pr_number: Option<u64>,
    /// Git ref being deployed
    pub git_ref: String,
    /// Branch name
    pub branch: String,
    /// Link to the workflow run
    pub log_url: String,
    /// User that triggered the run
    pub actor: String,
    /// Pull request comes from another repository
    pub is_fork: bool,
}

/// Local-mode overrides for inputs that are otherwise static
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalOverrides {
    /// `PRODUCTION` env var (or `!IS_PR`)
    pub production: bool,
    /// `TRIM_COMMIT_MESSAGE` env var
    pub trim_commit_message: bool,
}

/// Triggering event as seen by a hosted runner
#[derive(Debug, Clone, Default)]
pub struct EventContext {
    /// `GITHUB_EVENT_NAME`
    pub name: String,
    /// Parsed webhook payload (empty object when unavailable)
    pub payload: Value,
    /// `GITHUB_SHA`
    pub sha: String,
    /// `GITHUB_REF`
    pub git_ref: String,
    /// `GITHUB_ACTOR`
    pub actor: String,
    /// `GITHUB_RUN_ID`
    pub run_id: String,
    /// `GITHUB_SERVER_URL`
    pub server_url: String,
}

impl EventContext {
    /// Read the event from runner-provided variables
    pub fn from_vars(vars: &dyn VarSource) -> Self {
        let payload = vars
            .var("GITHUB_EVENT_PATH")
            .filter(|p| !p.is_empty())
            .map(|p| read_payload(Path::new(&p)))
            .unwrap_or_else(empty_payload);

        Self {
            name: vars.var("GITHUB_EVENT_NAME").unwrap_or_default(),
            payload,
            sha: vars.var("GITHUB_SHA").unwrap_or_default(),
            git_ref: vars.var("GITHUB_REF").unwrap_or_default(),
            actor: vars.var("GITHUB_ACTOR").unwrap_or_default(),
            run_id: vars.var("GITHUB_RUN_ID").unwrap_or_default(),
            server_url: vars
                .var("GITHUB_SERVER_URL")
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "https://github.com".to_string()),
        }
    }

    /// `pull_request` and `pull_request_target` count as pull requests
    pub fn is_pull_request(&self) -> bool {
        matches!(self.name.as_str(), "pull_request" | "pull_request_target")
    }

    fn str_at(&self, pointer: &str) -> String {
        self.payload
            .pointer(pointer)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

fn empty_payload() -> Value {
    Value::Object(Default::default())
}

fn read_payload(path: &Path) -> Value {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed event payload {}: {}", path.display(), e);
            empty_payload()
        }),
        Err(e) => {
            tracing::warn!("Could not read event payload {}: {}", path.display(), e);
            empty_payload()
        }
    }
}

/// Split `owner/name`, tolerating malformed values
pub fn split_repository(full_name: &str) -> (String, String) {
    let mut parts = full_name.splitn(2, '/');
    let user = parts.next().unwrap_or_default().to_string();
    let repo = parts.next().unwrap_or_default().to_string();
    (user, repo)
}

/// Integer prefix of a value such as `12abc`; `None` if there are no digits
fn leading_number(value: &str) -> Option<u64> {
    let value = value.trim_start();
    let value = value.strip_prefix('+').unwrap_or(value);
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    value[..end].parse().ok()
}

/// Derive the context for a local run from plain environment variables
pub fn derive_local(github_repository: &str, vars: &dyn VarSource) -> (RunContext, LocalOverrides) {
    let (user, repository) = split_repository(github_repository);
    let flag = |name: &str| vars.var(name).as_deref() == Some("true");
    let non_empty = |name: &str| vars.var(name).filter(|v| !v.is_empty());

    let is_pr = flag("IS_PR");
    let log_url = non_empty("LOG_URL")
        .unwrap_or_else(|| format!("https://github.com/{}/{}", user, repository));
    let actor = non_empty("ACTOR").unwrap_or_else(|| user.clone());

    let context = RunContext {
        sha: non_empty("SHA").unwrap_or_else(|| LOCAL_SHA.to_string()),
        is_pr,
        pr_number: vars.var("PR_NUMBER").as_deref().and_then(leading_number),
        git_ref: non_empty("REF").unwrap_or_else(|| "refs/heads/master".to_string()),
        branch: non_empty("BRANCH").unwrap_or_else(|| "master".to_string()),
        log_url,
        actor,
        is_fork: flag("IS_FORK"),
        user,
        repository,
    };

    let overrides = LocalOverrides {
        production: flag("PRODUCTION") || !is_pr,
        trim_commit_message: flag("TRIM_COMMIT_MESSAGE"),
    };

    (context, overrides)
}

/// Derive the context for a hosted run from the triggering event
pub fn derive_hosted(github_repository: &str, event: &EventContext) -> RunContext {
    let (user, repository) = split_repository(github_repository);
    let log_url = format!(
        "{}/{}/{}/actions/runs/{}",
        event.server_url.trim_end_matches('/'),
        user,
        repository,
        event.run_id
    );

    let mut context = RunContext {
        user,
        repository,
        log_url,
        is_pr: event.is_pull_request(),
        ..Default::default()
    };

    if context.is_pr {
        context.pr_number = event.payload.get("number").and_then(Value::as_u64);
        context.actor = event.str_at("/pull_request/user/login");
        context.git_ref = event.str_at("/pull_request/head/ref");
        context.sha = event.str_at("/pull_request/head/sha");
        context.branch = context.git_ref.clone();
        context.is_fork = event.str_at("/pull_request/head/repo/full_name") != github_repository;
    } else {
        context.actor = event.actor.clone();
        context.git_ref = event.git_ref.clone();
        context.sha = event.sha.clone();
        context.branch = event
            .git_ref
            .get(HEADS_PREFIX_LEN..)
            .unwrap_or_default()
            .to_string();
    }

    context
}
