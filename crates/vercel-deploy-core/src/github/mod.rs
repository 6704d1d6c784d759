//! GitHub API integration

pub mod client;
mod models;

pub use client::{dedent, GitHubClient, COMMENT_MARKER, DEFAULT_API_URL};
