//! Output value formatting and workflow-command escaping

use crate::types::ActionOutputs;

/// Escape data for a workflow command (`::warning::<data>`)
pub fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Render a bool the way `@actions/core` does
#[inline]
pub const fn bool_str(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

/// Step outputs as ordered `(name, value)` pairs
///
/// Unset optional values are skipped. `DEPLOYMENT_URLS` is a JSON array.
pub fn output_pairs(outputs: &ActionOutputs) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::with_capacity(7);

    if let Some(ref url) = outputs.preview_url {
        pairs.push(("PREVIEW_URL", url.clone()));
    }
    if !outputs.deployment_urls.is_empty() {
        let urls = serde_json::to_string(&outputs.deployment_urls)
            .unwrap_or_else(|_| "[]".to_string());
        pairs.push(("DEPLOYMENT_URLS", urls));
    }
    if let Some(ref url) = outputs.deployment_unique_url {
        pairs.push(("DEPLOYMENT_UNIQUE_URL", url.clone()));
    }
    if let Some(ref id) = outputs.deployment_id {
        pairs.push(("DEPLOYMENT_ID", id.clone()));
    }
    if let Some(ref url) = outputs.deployment_inspector_url {
        pairs.push(("DEPLOYMENT_INSPECTOR_URL", url.clone()));
    }
    pairs.push((
        "DEPLOYMENT_CREATED",
        bool_str(outputs.deployment_created).to_string(),
    ));
    pairs.push(("COMMENT_CREATED", bool_str(outputs.comment_created).to_string()));

    pairs
}
