//! External process execution

use crate::error::{Error, Result};
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};

/// A single process invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    /// Executable name or path
    pub program: String,
    /// Arguments, passed verbatim
    pub args: Vec<String>,
    /// Working directory (inherits the current one when `None`)
    pub cwd: Option<PathBuf>,
    /// Extra environment variables for the child
    pub envs: Vec<(String, String)>,
}

impl CommandLine {
    /// Create an invocation of `program` with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    /// Append arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory
    pub fn cwd(mut self, cwd: Option<impl Into<PathBuf>>) -> Self {
        self.cwd = cwd.map(Into::into);
        self
    }

    /// Add environment variables
    pub fn envs(mut self, envs: &[(String, String)]) -> Self {
        self.envs.extend_from_slice(envs);
        self
    }

    /// Printable form with `--token=` values hidden
    pub fn display_redacted(&self) -> String {
        let mut out = self.program.clone();
        for arg in &self.args {
            out.push(' ');
            if arg.starts_with("--token=") {
                out.push_str("--token=***");
            } else {
                out.push_str(arg);
            }
        }
        out
    }
}

/// Runs external commands
///
/// Implementations resolve with trimmed stdout when the command exits 0
/// and fail with [`Error::Process`] otherwise.
pub trait CommandRunner {
    /// Run the command to completion
    fn run(&self, command: &CommandLine) -> impl Future<Output = Result<String>> + Send;
}

/// [`CommandRunner`] backed by `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &CommandLine) -> Result<String> {
        let cwd_display = command
            .cwd
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ".".to_string());
        tracing::debug!("EXEC: \"{}\" in {}", command.display_redacted(), cwd_display);

        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args)
            .envs(command.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(ref cwd) = command.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(|e| {
            Error::Process(format!("Failed to start `{}`: {}", command.program, e))
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Drain both pipes together so a chatty stderr cannot block stdout
        let (stdout, stderr) = tokio::try_join!(collect(stdout), collect(stderr))?;
        let status = child.wait().await?;

        if status.success() {
            return Ok(stdout.trim().to_string());
        }

        let stderr = stderr.trim();
        if stderr.is_empty() {
            let code = status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            Err(Error::Process(format!(
                "{} exited with status {}",
                command.program, code
            )))
        } else {
            Err(Error::Process(stderr.to_string()))
        }
    }
}

/// Read a pipe to the end, echoing each chunk at debug level
async fn collect<R>(pipe: Option<R>) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    let Some(mut pipe) = pipe else {
        return Ok(String::new());
    };

    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = pipe.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        tracing::debug!("{}", String::from_utf8_lossy(&chunk[..n]));
        buf.extend_from_slice(&chunk[..n]);
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn sh(script: &str) -> CommandLine {
        CommandLine::new("sh").args(["-c", script])
    }

    #[tokio::test]
    async fn test_success_trims_stdout() {
        let out = ProcessRunner.run(&sh("printf '  hello world \\n\\n'")).await.unwrap();
        assert_eq!(out, "hello world");
    }

    #[tokio::test]
    async fn test_failure_carries_stderr() {
        let err = ProcessRunner
            .run(&sh("echo partial; echo 'Error: no credentials' >&2; exit 3"))
            .await
            .unwrap_err();
        assert_matches!(err, Error::Process(ref msg) if msg.contains("Error: no credentials"));
    }

    #[tokio::test]
    async fn test_failure_without_stderr_is_synthetic() {
        let err = ProcessRunner.run(&sh("exit 7")).await.unwrap_err();
        assert_matches!(err, Error::Process(ref msg) if msg == "sh exited with status 7");
    }

    #[tokio::test]
    async fn test_spawn_failure_does_not_hang() {
        let cmd = CommandLine::new("definitely-not-a-real-binary-4f7a");
        let err = tokio::time::timeout(std::time::Duration::from_secs(5), ProcessRunner.run(&cmd))
            .await
            .expect("runner hung on spawn failure")
            .unwrap_err();
        assert_matches!(err, Error::Process(ref msg) if msg.contains("definitely-not-a-real-binary-4f7a"));
    }

    #[tokio::test]
    async fn test_cwd_and_env_are_applied() {
        let dir = tempfile::TempDir::new().unwrap();
        let cmd = sh("echo \"$VERCEL_ORG_ID\"; pwd")
            .cwd(Some(dir.path()))
            .envs(&[("VERCEL_ORG_ID".to_string(), "team_123".to_string())]);
        let out = ProcessRunner.run(&cmd).await.unwrap();
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("team_123"));
        let pwd = std::fs::canonicalize(lines.next().unwrap()).unwrap();
        assert_eq!(pwd, std::fs::canonicalize(dir.path()).unwrap());
    }

    #[tokio::test]
    async fn test_large_stderr_does_not_deadlock() {
        let out = ProcessRunner
            .run(&sh("head -c 200000 /dev/zero | tr '\\0' x >&2; echo ok"))
            .await
            .unwrap();
        assert_eq!(out, "ok");
    }

    #[test]
    fn test_display_redacts_token() {
        let cmd = CommandLine::new("vercel").args(["--token=abc123", "--prod"]);
        assert_eq!(cmd.display_redacted(), "vercel --token=*** --prod");
    }
}
