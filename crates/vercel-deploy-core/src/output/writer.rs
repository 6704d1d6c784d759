//! GitHub Actions file commands (`$GITHUB_OUTPUT`, `$GITHUB_ENV`)

use super::format::{escape_data, output_pairs};
use crate::error::{Error, Result};
use crate::types::ActionOutputs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Heredoc delimiter for multi-line values
const DELIMITER: &str = "VERCEL_DEPLOY_EOF";

/// Writer for runner-provided command files
#[derive(Debug, Clone, Default)]
pub struct ActionFiles {
    output_file: Option<PathBuf>,
    env_file: Option<PathBuf>,
}

impl ActionFiles {
    /// Create a writer for explicit file paths
    pub fn new(output_file: Option<PathBuf>, env_file: Option<PathBuf>) -> Self {
        Self {
            output_file,
            env_file,
        }
    }

    /// Create from `GITHUB_OUTPUT` and `GITHUB_ENV`
    pub fn from_env() -> Self {
        let path = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
        };
        Self::new(path("GITHUB_OUTPUT"), path("GITHUB_ENV"))
    }

    /// Whether step outputs have somewhere to go
    pub fn has_output_file(&self) -> bool {
        self.output_file.is_some()
    }

    /// Export a variable for later steps
    ///
    /// Without `$GITHUB_ENV` (local runs) this only logs.
    pub fn export_variable(&self, name: &str, value: &str) -> Result<()> {
        match self.env_file {
            Some(ref path) => append_key_value(path, name, value),
            None => {
                tracing::debug!("GITHUB_ENV not set, not exporting {}", name);
                Ok(())
            }
        }
    }

    /// Append all step outputs to `$GITHUB_OUTPUT`
    pub fn write_outputs(&self, outputs: &ActionOutputs) -> Result<()> {
        let path = self
            .output_file
            .as_ref()
            .ok_or_else(|| Error::Config("GITHUB_OUTPUT is not set".to_string()))?;

        for (name, value) in output_pairs(outputs) {
            append_key_value(path, name, &value)?;
        }
        Ok(())
    }
}

/// Register a value with the runner's log masker
pub fn add_mask(value: &str) {
    if value.is_empty() {
        return;
    }
    let stdout = std::io::stdout();
    let mut w = stdout.lock();
    let _ = writeln!(w, "::add-mask::{}", escape_data(value));
}

/// Append `name<<DELIM\nvalue\nDELIM` to a command file
fn append_key_value(path: &Path, name: &str, value: &str) -> Result<()> {
    if name.contains(DELIMITER) || value.contains(DELIMITER) {
        return Err(Error::Config(format!(
            "Value for {} contains the reserved delimiter {}",
            name, DELIMITER
        )));
    }

    let mut f = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)?;

    writeln!(f, "{name}<<{DELIMITER}")?;
    writeln!(f, "{value}")?;
    writeln!(f, "{DELIMITER}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_outputs() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("output");
        let files = ActionFiles::new(Some(out.clone()), None);

        files.write_outputs(&ActionOutputs::fork_refused()).unwrap();

        let content = std::fs::read_to_string(&out).unwrap();
        assert_eq!(
            content,
            "DEPLOYMENT_CREATED<<VERCEL_DEPLOY_EOF\nfalse\nVERCEL_DEPLOY_EOF\n\
             COMMENT_CREATED<<VERCEL_DEPLOY_EOF\ntrue\nVERCEL_DEPLOY_EOF\n"
        );
    }

    #[test]
    fn test_write_outputs_without_file() {
        let files = ActionFiles::default();
        assert!(files.write_outputs(&ActionOutputs::default()).is_err());
    }

    #[test]
    fn test_export_variable_appends() {
        let dir = TempDir::new().unwrap();
        let env = dir.path().join("env");
        std::fs::write(&env, "EXISTING<<X\n1\nX\n").unwrap();
        let files = ActionFiles::new(None, Some(env.clone()));

        files.export_variable("VERCEL_ORG_ID", "team_123").unwrap();

        let content = std::fs::read_to_string(&env).unwrap();
        assert!(content.starts_with("EXISTING<<X\n"));
        assert!(content.ends_with("VERCEL_ORG_ID<<VERCEL_DEPLOY_EOF\nteam_123\nVERCEL_DEPLOY_EOF\n"));
    }

    #[test]
    fn test_export_variable_without_env_file_is_noop() {
        assert!(ActionFiles::default().export_variable("A", "b").is_ok());
    }

    #[test]
    fn test_reserved_delimiter_rejected() {
        let dir = TempDir::new().unwrap();
        let files = ActionFiles::new(None, Some(dir.path().join("env")));
        assert!(files.export_variable("A", "x VERCEL_DEPLOY_EOF y").is_err());
    }
}
