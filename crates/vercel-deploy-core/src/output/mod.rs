//! Step outputs and runner file commands

pub mod format;
pub mod writer;

pub use writer::{add_mask, ActionFiles};
