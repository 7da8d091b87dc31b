//! Test doubles for the command and readiness seams.
//!
//! Provides:
//! - [`ScriptedRunner`]: a [`CommandRunner`] that replays canned responses
//!   and records every command it was asked to run
//! - [`ScriptedReadiness`]: a [`ReadinessCheck`] that replays a sequence of
//!   readiness answers
//!
//! # Usage
//!
//! ```rust,no_run
//! use stack_harness::testing::ScriptedRunner;
//!
//! let runner = ScriptedRunner::new()
//!     .ok("docker stack ls", "wdio\n")
//!     .fallback("docker network ls", "");
//! ```

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use crate::docker::ReadinessCheck;
use crate::error::{CommandError, PredicateError};
use crate::exec::{CommandOutput, CommandRunner};

#[derive(Debug, Clone)]
enum Reply {
    Ok(String),
    Fail(String),
}

impl Reply {
    fn into_result(self, command: &str) -> Result<CommandOutput, CommandError> {
        match self {
            Reply::Ok(stdout) => Ok(CommandOutput::from_stdout(stdout)),
            Reply::Fail(stderr) => Err(CommandError::Failed {
                command: command.to_string(),
                code: Some(1),
                stderr,
            }),
        }
    }
}

/// A [`CommandRunner`] driven by a script.
///
/// Each scripted reply is keyed by a command prefix. Replies are consumed in
/// the order they were added; once the one-shot replies for a command are
/// used up, the longest matching fallback answers. A command with no
/// matching reply fails with exit status 1.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    script: Mutex<VecDeque<(String, Reply)>>,
    fallbacks: Vec<(String, Reply)>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the next command starting with `prefix` with `stdout`.
    pub fn ok(self, prefix: impl Into<String>, stdout: impl Into<String>) -> Self {
        self.push(prefix.into(), Reply::Ok(stdout.into()))
    }

    /// Fail the next command starting with `prefix` with `stderr`.
    pub fn fail(self, prefix: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.push(prefix.into(), Reply::Fail(stderr.into()))
    }

    /// Answer every otherwise unscripted command starting with `prefix`.
    pub fn fallback(mut self, prefix: impl Into<String>, stdout: impl Into<String>) -> Self {
        self.fallbacks
            .push((prefix.into(), Reply::Ok(stdout.into())));
        self
    }

    /// Fail every otherwise unscripted command starting with `prefix`.
    pub fn fallback_fail(mut self, prefix: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.fallbacks
            .push((prefix.into(), Reply::Fail(stderr.into())));
        self
    }

    fn push(self, prefix: String, reply: Reply) -> Self {
        self.script
            .lock()
            .expect("script lock poisoned")
            .push_back((prefix, reply));
        self
    }

    /// Every command run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    /// Number of commands run so far that start with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &str) -> Result<CommandOutput, CommandError> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(command.to_string());

        let scripted = {
            let mut script = self.script.lock().expect("script lock poisoned");
            script
                .iter()
                .position(|(prefix, _)| command.starts_with(prefix.as_str()))
                .and_then(|idx| script.remove(idx))
                .map(|(_, reply)| reply)
        };

        let reply = scripted.or_else(|| {
            self.fallbacks
                .iter()
                .filter(|(prefix, _)| command.starts_with(prefix.as_str()))
                .max_by_key(|(prefix, _)| prefix.len())
                .map(|(_, reply)| reply.clone())
        });

        match reply {
            Some(reply) => reply.into_result(command),
            None => Err(CommandError::Failed {
                command: command.to_string(),
                code: Some(1),
                stderr: "unscripted command".to_string(),
            }),
        }
    }
}

/// A [`ReadinessCheck`] that answers from a fixed sequence.
///
/// Once the sequence is exhausted the last answer repeats; an empty
/// sequence is never ready.
#[derive(Debug)]
pub struct ScriptedReadiness {
    answers: Vec<Result<bool, String>>,
    checks: AtomicU32,
}

impl ScriptedReadiness {
    /// Ready after `not_ready` negative answers.
    pub fn ready_after(not_ready: usize) -> Self {
        let mut answers = vec![Ok(false); not_ready];
        answers.push(Ok(true));
        Self::from_answers(answers)
    }

    /// Never reports ready.
    pub fn never() -> Self {
        Self::from_answers(vec![Ok(false)])
    }

    /// Explicit sequence; `Err` entries surface as malformed responses.
    pub fn from_answers(answers: Vec<Result<bool, String>>) -> Self {
        Self {
            answers,
            checks: AtomicU32::new(0),
        }
    }

    /// Number of checks performed so far.
    pub fn checks(&self) -> u32 {
        self.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReadinessCheck for ScriptedReadiness {
    fn describe(&self) -> String {
        "scripted readiness".to_string()
    }

    async fn check(&self) -> Result<bool, PredicateError> {
        let n = self.checks.fetch_add(1, Ordering::SeqCst) as usize;
        let answer = self
            .answers
            .get(n)
            .or_else(|| self.answers.last())
            .cloned()
            .unwrap_or(Ok(false));
        answer.map_err(PredicateError::Malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_runner_consumes_in_order() {
        let runner = ScriptedRunner::new()
            .ok("docker stack ls", "first")
            .ok("docker stack ls", "second")
            .fallback("docker stack ls", "rest");

        let cmd = "docker stack ls --format '{{.Name}}'";
        assert_eq!(runner.run(cmd).await.unwrap().stdout, "first");
        assert_eq!(runner.run(cmd).await.unwrap().stdout, "second");
        assert_eq!(runner.run(cmd).await.unwrap().stdout, "rest");
        assert_eq!(runner.count("docker stack ls"), 3);
    }

    #[tokio::test]
    async fn test_scripted_runner_unscripted_fails() {
        let runner = ScriptedRunner::new();
        assert!(runner.run("docker swarm init").await.is_err());
        assert_eq!(runner.calls(), vec!["docker swarm init".to_string()]);
    }

    #[tokio::test]
    async fn test_scripted_readiness_repeats_last() {
        let check = ScriptedReadiness::ready_after(1);
        assert!(!check.check().await.unwrap());
        assert!(check.check().await.unwrap());
        assert!(check.check().await.unwrap());
        assert_eq!(check.checks(), 3);
    }
}
