//! Vercel CLI argument lists and output parsing

use crate::alias::remove_schema;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::types::Commit;
use once_cell::sync::OnceCell;
use regex::Regex;

/// Deployment URL: the rest of the line after the first `http(s)://`
static DEPLOYMENT_URL: OnceCell<Regex> = OnceCell::new();

fn deployment_url_regex() -> Result<&'static Regex> {
    DEPLOYMENT_URL.get_or_try_init(|| {
        Regex::new(r"https?://(.*)")
            .map_err(|e| Error::Parse(format!("Invalid deployment URL pattern: {}", e)))
    })
}

/// Arguments for `vercel` deploy
///
/// Order: token, scope, `--prod`, target, `--prebuilt`, `--force`,
/// commit metadata, then build env entries.
pub fn deploy_args(settings: &Settings, commit: Option<&Commit>) -> Vec<String> {
    let mut args = vec![format!("--token={}", settings.vercel_token.expose())];

    if let Some(ref scope) = settings.vercel_scope {
        args.push(format!("--scope={}", scope));
    }
    if settings.production {
        args.push("--prod".to_string());
    }
    if let Some(ref target) = settings.vercel_target {
        args.push(format!("--target={}", target));
    }
    if settings.prebuilt {
        args.push("--prebuilt".to_string());
    }
    if settings.force {
        args.push("--force".to_string());
    }

    if let Some(commit) = commit {
        for item in commit_metadata(settings, commit) {
            args.push("--meta".to_string());
            args.push(item);
        }
    }

    for item in &settings.build_env {
        args.push("--build-env".to_string());
        args.push(item.clone());
    }

    args
}

/// `key=value` metadata pairs Vercel shows next to the deployment
///
/// The org/repo pairs appear twice under different keys; Vercel reads both.
pub fn commit_metadata(settings: &Settings, commit: &Commit) -> Vec<String> {
    let run = &settings.run;
    let message = if settings.trim_commit_message {
        commit.first_line()
    } else {
        commit.message.as_str()
    };

    vec![
        format!("githubCommitAuthorName={}", commit.author_name),
        format!("githubCommitAuthorLogin={}", commit.author_login),
        format!("githubCommitMessage={}", message),
        format!("githubCommitOrg={}", run.user),
        format!("githubCommitRepo={}", run.repository),
        format!("githubCommitRef={}", run.git_ref),
        format!("githubCommitSha={}", run.sha),
        format!("githubOrg={}", run.user),
        format!("githubRepo={}", run.repository),
        "githubDeployment=1".to_string(),
    ]
}

/// Arguments for `vercel alias set`
pub fn alias_args(settings: &Settings, deployment_url: &str, alias: &str) -> Vec<String> {
    let mut args = vec![
        format!("--token={}", settings.vercel_token.expose()),
        "alias".to_string(),
        "set".to_string(),
        deployment_url.to_string(),
        remove_schema(alias).to_string(),
    ];
    if let Some(ref scope) = settings.vercel_scope {
        args.push(format!("--scope={}", scope));
    }
    args
}

/// Extract the deployment URL (without schema) from deploy output
pub fn parse_deployment_url(stdout: &str) -> Result<String> {
    deployment_url_regex()?
        .captures(stdout)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end().to_string())
        .filter(|url| !url.is_empty())
        .ok_or_else(|| Error::Parse("Could not parse deployment URL".to_string()))
}
