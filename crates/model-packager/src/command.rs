//! External command execution
//!
//! This module models the export subprocess as an explicit collaborator so
//! that callers and tests can substitute a fake without spawning real
//! processes.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use common::error::{Error, Result};

/// Captured result of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Process exit code, if the process terminated normally
    pub exit_code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CommandOutput {
    /// Returns true if the command exited with status zero
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Outcome of the artifact export step
///
/// A failed export does not abort repository assembly; the outcome is carried
/// on the repository handle so callers can decide what a partial repository
/// is worth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Export command exited zero; both compiled artifacts should be present
    Succeeded,
    /// Export command failed; compiled artifacts may be absent or partial
    Failed {
        /// Exit code, if the command ran to termination
        exit_code: Option<i32>,
        /// Captured diagnostic text
        stderr: String,
    },
}

impl ExportOutcome {
    /// Returns true if the export succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, ExportOutcome::Succeeded)
    }
}

/// Executes external commands on behalf of the packager
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args`, blocking until exit or until `timeout`
    /// elapses
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        timeout: Option<Duration>,
    ) -> Result<CommandOutput>;
}

/// Runner that spawns real processes
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        timeout: Option<Duration>,
    ) -> Result<CommandOutput> {
        debug!("Running {} {:?}", program.display(), args);

        let output_future = tokio::process::Command::new(program).args(args).output();

        let output = match timeout {
            Some(limit) => tokio::time::timeout(limit, output_future)
                .await
                .map_err(|_| {
                    Error::Timeout(format!(
                        "{} did not finish within {}s",
                        program.display(),
                        limit.as_secs()
                    ))
                })??,
            None => output_future.await?,
        };

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_captures_exit_code_and_streams() {
        let runner = SystemCommandRunner;

        let output = runner
            .run(
                Path::new("/bin/sh"),
                &["-c".to_string(), "echo out; echo err >&2; exit 3".to_string()],
                None,
            )
            .await
            .unwrap();

        assert_eq!(output.exit_code, Some(3));
        assert!(!output.success());
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[tokio::test]
    async fn test_run_success() {
        let runner = SystemCommandRunner;

        let output = runner
            .run(Path::new("/bin/sh"), &["-c".to_string(), "exit 0".to_string()], None)
            .await
            .unwrap();

        assert!(output.success());
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let runner = SystemCommandRunner;

        let err = runner
            .run(
                Path::new("/bin/sh"),
                &["-c".to_string(), "sleep 5".to_string()],
                Some(Duration::from_millis(100)),
            )
            .await
            .unwrap_err();

        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_run_missing_program() {
        let runner = SystemCommandRunner;

        let err = runner
            .run(Path::new("/nonexistent/export.sh"), &[], None)
            .await
            .unwrap_err();

        assert!(err.is_io());
    }
}
