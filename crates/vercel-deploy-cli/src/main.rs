#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::Context;
use clap::Parser;
use std::io::Write;
use vercel_deploy_core::logging::{failure_line, init_logging};
use vercel_deploy_core::output::add_mask;
use vercel_deploy_core::{
    deploy, github, vercel, ActionFiles, ActionOutputs, DeployOptions, Settings, VercelOptions,
};

#[derive(Parser)]
#[command(
    name = "vercel-deploy",
    version,
    about = "Deploy to Vercel and report back to GitHub"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Deploy the repository, assign aliases and update the pull request
    Deploy(DeployArgs),
}

#[derive(clap::Args)]
struct DeployArgs {
    /// Vercel CLI executable
    #[arg(long, env = "VERCEL_BIN", default_value = vercel::DEFAULT_VERCEL_BIN)]
    vercel_bin: String,

    /// Vercel API base URL
    #[arg(long, env = "VERCEL_API_URL")]
    vercel_api_url: Option<String>,

    /// GitHub API base URL
    #[arg(long, env = "GITHUB_API_URL")]
    github_api_url: Option<String>,

    /// Output format: gha, json, text (default: auto-detect)
    #[arg(long, env = "VERCEL_DEPLOY_OUTPUT_FORMAT")]
    output_format: Option<String>,

    /// Do not query the Vercel API for deployment details
    #[arg(long)]
    skip_deployment_lookup: bool,

    /// Log level when RUST_LOG is unset (default: info)
    #[arg(long, env = "VERCEL_DEPLOY_LOG")]
    log_level: Option<String>,
}

/// Output format for the CLI
#[derive(Debug, PartialEq, Eq)]
enum OutputFormat {
    /// GitHub Actions: write to $GITHUB_OUTPUT
    Gha,
    /// Outputs as one JSON object on stdout
    Json,
    /// Human-readable summary on stdout
    Text,
}

impl OutputFormat {
    fn detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("gha") => OutputFormat::Gha,
            Some("json") => OutputFormat::Json,
            Some("text") => OutputFormat::Text,
            _ => {
                if std::env::var("GITHUB_ACTIONS").is_ok() {
                    OutputFormat::Gha
                } else {
                    OutputFormat::Text
                }
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Deploy(args) => run_deploy(args),
    };
    std::process::exit(code);
}

/// Filter empty string from Option (env vars may produce "" for empty values)
fn clean_opt(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

fn run_deploy(args: DeployArgs) -> i32 {
    if let Err(e) = init_logging(clean_opt(&args.log_level)) {
        eprintln!("Warning: {e}");
    }

    match try_deploy(&args) {
        Ok(()) => {
            tracing::info!("Action completed successfully");
            0
        }
        Err(e) => {
            let stdout = std::io::stdout();
            let mut w = stdout.lock();
            let _ = writeln!(w, "{}", failure_line(&failure_message(&e)));
            1
        }
    }
}

/// Error chain joined with `: `, skipping causes the previous link already prints
fn failure_message(e: &anyhow::Error) -> String {
    let mut message = String::new();
    for cause in e.chain() {
        let text = cause.to_string();
        if message.ends_with(&text) {
            continue;
        }
        if !message.is_empty() {
            message.push_str(": ");
        }
        message.push_str(&text);
    }
    message
}

fn try_deploy(args: &DeployArgs) -> anyhow::Result<()> {
    let settings = Settings::from_env().context("Failed to load action inputs")?;
    for secret in settings.secrets() {
        add_mask(secret);
    }

    let files = ActionFiles::from_env();
    let options = DeployOptions {
        github_api_url: clean_opt(&args.github_api_url)
            .unwrap_or(github::DEFAULT_API_URL)
            .to_string(),
        vercel: VercelOptions {
            vercel_bin: args.vercel_bin.clone(),
            api_url: clean_opt(&args.vercel_api_url)
                .unwrap_or(vercel::DEFAULT_API_URL)
                .to_string(),
            skip_lookup: args.skip_deployment_lookup,
        },
    };

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create runtime")?;

    let outputs = rt.block_on(deploy(&settings, options, &files))?;

    match OutputFormat::detect(clean_opt(&args.output_format)) {
        OutputFormat::Gha => write_gha_output(&files, &outputs)?,
        OutputFormat::Json => write_json_output(&outputs)?,
        OutputFormat::Text => write_text_output(&outputs),
    }

    tracing::info!("Done");
    Ok(())
}

/// Write outputs using GitHub Actions multiline syntax to $GITHUB_OUTPUT
fn write_gha_output(files: &ActionFiles, outputs: &ActionOutputs) -> anyhow::Result<()> {
    if !files.has_output_file() {
        tracing::warn!("GITHUB_OUTPUT not set, falling back to stdout");
        return write_json_output(outputs);
    }

    files
        .write_outputs(outputs)
        .context("Failed to write step outputs")?;

    if let Some(ref url) = outputs.preview_url {
        tracing::info!("Preview URL: {}", url);
    }
    Ok(())
}

/// Write outputs as one JSON object to stdout
fn write_json_output(outputs: &ActionOutputs) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    serde_json::to_writer(&mut lock, outputs).context("Failed to serialize outputs")?;
    writeln!(lock)?;
    Ok(())
}

/// Write a human-readable summary to stdout
fn write_text_output(outputs: &ActionOutputs) {
    let stdout = std::io::stdout();
    let mut w = stdout.lock();

    let _ = writeln!(w, "Vercel Deployment");
    let _ = writeln!(w, "=================");

    if !outputs.deployment_created {
        let _ = writeln!(w, "No deployment created");
        let _ = writeln!(w, "Comment created: {}", outputs.comment_created);
        return;
    }

    if let Some(ref id) = outputs.deployment_id {
        let _ = writeln!(w, "Deployment: {id}");
    }
    if let Some(ref url) = outputs.preview_url {
        let _ = writeln!(w, "Preview: {url}");
    }
    if let Some(ref url) = outputs.deployment_inspector_url {
        if !url.is_empty() {
            let _ = writeln!(w, "Inspect: {url}");
        }
    }

    let _ = writeln!(w, "\nURLs ({}):", outputs.deployment_urls.len());
    for url in &outputs.deployment_urls {
        let _ = writeln!(w, "  {url}");
    }

    let _ = writeln!(w, "\nComment created: {}", outputs.comment_created);
}
