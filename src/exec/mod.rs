//! External process execution.
//!
//! Every shell command the harness issues goes through [`CommandRunner`].
//! The production implementation is [`ShellRunner`]; tests substitute
//! [`crate::testing::ScriptedRunner`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::CommandError;

/// Captured output of a command that exited successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl CommandOutput {
    /// Output with the given stdout and nothing else.
    pub fn from_stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Default::default()
        }
    }

    /// Non-empty, trimmed lines of stdout.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }
}

/// Runs a single shell command to completion.
///
/// Implementations must not retry: a non-zero exit is reported as
/// [`CommandError::Failed`] and the caller decides what to do with it.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &str) -> Result<CommandOutput, CommandError>;
}

/// Runs commands through the platform shell.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    timeout: Option<Duration>,
}

impl ShellRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill and fail any command that runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn shell_command(command: &str) -> Command {
        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };
        cmd.kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str) -> Result<CommandOutput, CommandError> {
        let start = Instant::now();
        tracing::debug!(%command, "Running command");

        let pending = Self::shell_command(command).output();
        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, pending).await.map_err(|_| {
                CommandError::TimedOut {
                    command: command.to_string(),
                    timeout,
                }
            })?,
            None => pending.await,
        }
        .map_err(|e| CommandError::Spawn {
            command: command.to_string(),
            source: e,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(CommandError::Failed {
                command: command.to_string(),
                code: output.status.code(),
                stderr,
            });
        }

        Ok(CommandOutput {
            stdout,
            stderr,
            duration: start.elapsed(),
        })
    }
}

/// Quote a single argument for a POSIX shell command line.
///
/// Arguments made only of safe characters are returned unchanged.
pub fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@,+".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
