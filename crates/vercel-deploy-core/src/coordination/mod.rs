//! Deployment orchestration

pub mod comment;
pub mod pipeline;

pub use pipeline::DeployPipeline;
