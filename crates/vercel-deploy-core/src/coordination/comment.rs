//! Pull request comment bodies
//!
//! Bodies are written indented; the GitHub client dedents them before posting.

use crate::alias::short_sha;
use crate::config::RunContext;
use crate::github::COMMENT_MARKER;

/// Where to read about deploying pull requests from forks
const FORK_DOCS_URL: &str =
    "https://github.com/BetaHuhn/deploy-to-vercel-action#deploying-a-pr-made-from-a-fork-or-dependabot";

/// Comment posted instead of deploying an untrusted fork
pub fn fork_refusal(run: &RunContext) -> String {
    format!(
        "
        Refusing to deploy this Pull Request to Vercel because it originates from @{actor}'s fork.

        **@{owner}** To allow this behaviour set `DEPLOY_PR_FROM_FORK` to true ([more info]({docs})).
        ",
        actor = run.actor,
        owner = run.user,
        docs = FORK_DOCS_URL,
    )
}

/// Comment summarizing a finished deployment
pub fn deployment_summary(run: &RunContext, preview_url: &str, inspector_url: &str) -> String {
    format!(
        "
        {marker}

        <table>
            <tr>
                <td><strong>Latest commit:</strong></td>
                <td><code>{sha}</code></td>
            </tr>
            <tr>
                <td><strong>✅ Preview:</strong></td>
                <td><a href='{preview}'>{preview}</a></td>
            </tr>
            <tr>
                <td><strong>🔍 Inspect:</strong></td>
                <td><a href='{inspector}'>{inspector}</a></td>
            </tr>
        </table>

        [View Workflow Logs]({log_url})
        ",
        marker = COMMENT_MARKER,
        sha = short_sha(&run.sha),
        preview = preview_url,
        inspector = inspector_url,
        log_url = run.log_url,
    )
}
