//! Vercel integration

pub mod args;
pub mod client;

pub use args::{alias_args, commit_metadata, deploy_args, parse_deployment_url};
pub use client::{VercelClient, VercelOptions, DEFAULT_API_URL, DEFAULT_VERCEL_BIN};
