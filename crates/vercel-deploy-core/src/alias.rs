//! Alias domain templates
//!
//! Templates such as `{BRANCH}-{REPO}.vercel.app` are resolved against
//! the run context, lower-cased, and (for long `.vercel.app` names)
//! shortened the same way Vercel shortens its automatic branch URLs.

use crate::config::RunContext;
use sha2::{Digest, Sha256};

/// Vercel's default preview domain
pub const PREVIEW_DOMAIN_SUFFIX: &str = ".vercel.app";

/// Prefixes at or above this length get truncated
pub const MAX_ALIAS_LENGTH: usize = 60;

/// Length of a truncated prefix before the hash suffix
pub const TRUNCATED_PREFIX_LENGTH: usize = 55;

/// Characters of the commit SHA used for `{SHA}`
pub const SHA_LENGTH: usize = 7;

/// Characters of the hash appended to truncated aliases
const HASH_SUFFIX_LENGTH: usize = 6;

/// Replace every character outside `[A-Za-z0-9_~]` with `-`
pub fn url_safe_parameter(input: &str) -> String {
    input
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '~' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// First seven characters of a commit SHA
pub fn short_sha(sha: &str) -> &str {
    match sha.char_indices().nth(SHA_LENGTH) {
        Some((idx, _)) => &sha[..idx],
        None => sha,
    }
}

/// Which placeholders a template may use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Production alias domains: `{USER}`, `{REPO}`, `{BRANCH}`, `{SHA}`
    Production,
    /// Pull request preview domain: additionally `{PR}`
    PullRequest,
}

/// Resolve placeholders and lower-case the result
///
/// Each placeholder's first occurrence is substituted once. Substituted
/// values are never scanned again.
pub fn render_template(template: &str, ctx: &RunContext, kind: TemplateKind) -> String {
    let mut values: Vec<(&str, String)> = vec![
        ("{USER}", url_safe_parameter(&ctx.user)),
        ("{REPO}", url_safe_parameter(&ctx.repository)),
        ("{BRANCH}", url_safe_parameter(&ctx.branch)),
        ("{SHA}", short_sha(&ctx.sha).to_string()),
    ];
    if kind == TemplateKind::PullRequest {
        values.push((
            "{PR}",
            ctx.pr_number.map(|n| n.to_string()).unwrap_or_default(),
        ));
    }

    // Positions come from the original template only
    let mut hits: Vec<(usize, usize, &str)> = values
        .iter()
        .filter_map(|(key, value)| {
            template
                .find(key)
                .map(|start| (start, start + key.len(), value.as_str()))
        })
        .collect();
    hits.sort_by_key(|&(start, _, _)| start);

    let mut out = String::with_capacity(template.len() + 32);
    let mut cursor = 0;
    for (start, end, value) in hits {
        if start < cursor {
            continue;
        }
        out.push_str(&template[cursor..start]);
        out.push_str(value);
        cursor = end;
    }
    out.push_str(&template[cursor..]);

    out.to_lowercase()
}

/// Deterministic six-hex suffix for a branch/repository pair
pub fn alias_hash(branch: &str, repository: &str) -> String {
    let digest = Sha256::digest(format!("git-{}-{}", branch, repository).as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(HASH_SUFFIX_LENGTH);
    hex
}

/// Shorten long `.vercel.app` aliases
///
/// Aliases on other domains, and prefixes shorter than
/// [`MAX_ALIAS_LENGTH`], pass through unchanged.
pub fn generate_unique_alias(alias: &str, branch: &str, repository: &str) -> String {
    let Some(prefix) = alias.strip_suffix(PREVIEW_DOMAIN_SUFFIX) else {
        return alias.to_string();
    };

    if prefix.chars().count() < MAX_ALIAS_LENGTH {
        return alias.to_string();
    }

    tracing::warn!(
        "The alias {} exceeds {} chars in length, truncating using Vercel's rules. See https://vercel.com/docs/concepts/deployments/automatic-urls#automatic-branch-urls",
        prefix,
        MAX_ALIAS_LENGTH
    );

    let truncated: String = prefix.chars().take(TRUNCATED_PREFIX_LENGTH).collect();
    let next = format!(
        "{}-{}{}",
        truncated,
        alias_hash(branch, repository),
        PREVIEW_DOMAIN_SUFFIX
    );
    tracing::info!("Updated domain alias: {}", next);
    next
}

/// Prefix `https://` unless the URL already has a schema
pub fn add_schema(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Strip a leading `http://` or `https://`
pub fn remove_schema(url: &str) -> &str {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url)
}
