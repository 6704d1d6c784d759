#![no_main]
use libfuzzer_sys::fuzz_target;
use vercel_deploy_core::alias::{generate_unique_alias, render_template, TemplateKind};
use vercel_deploy_core::config::RunContext;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    // Fields separated by NUL: template, user, repo, branch, sha
    let mut parts = s.split('\0');
    let template = parts.next().unwrap_or("");
    let ctx = RunContext {
        user: parts.next().unwrap_or("").to_string(),
        repository: parts.next().unwrap_or("").to_string(),
        branch: parts.next().unwrap_or("").to_string(),
        sha: parts.next().unwrap_or("").to_string(),
        pr_number: Some(data.len() as u64),
        is_pr: true,
        ..Default::default()
    };

    for kind in [TemplateKind::Production, TemplateKind::PullRequest] {
        let alias = render_template(template, &ctx, kind);
        let _ = generate_unique_alias(&alias, &ctx.branch, &ctx.repository);
    }
});
