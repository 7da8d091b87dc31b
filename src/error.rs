//! Error types for the environment lifecycle.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// An external process exited non-zero, could not be spawned, or ran too long.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {}: {}", exit_label(.code), .stderr.trim())]
    Failed {
        command: String,
        /// Exit code, `None` when the process was killed by a signal.
        code: Option<i32>,
        stderr: String,
    },

    #[error("`{command}` did not finish within {timeout:?}")]
    TimedOut { command: String, timeout: Duration },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// A bounded poll ran out of attempts.
#[derive(Debug, Error)]
#[error("Timeout waiting for {operation} after {attempts} attempts")]
pub struct TimeoutError {
    /// Human-readable name of what was being waited on.
    pub operation: String,
    /// Attempts made before giving up.
    pub attempts: u32,
}

/// A single poll attempt could not be evaluated.
///
/// Never fatal on its own: the poll loop counts it as a failed attempt.
#[derive(Debug, Error)]
pub enum PredicateError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Unexpected HTTP status {0}")]
    UnexpectedStatus(u16),
}

/// Errors raised while bringing the environment up or tearing it down.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    #[error("Unexpected output from `{command}`: {reason}")]
    InvalidOutput { command: String, reason: String },

    #[error("Compose file not found: {}", .0.display())]
    ComposeFileMissing(PathBuf),
}

/// Static site server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Content root does not exist: {}", .0.display())]
    ContentRootMissing(PathBuf),

    #[error("Content root is empty: {}", .0.display())]
    ContentRootEmpty(PathBuf),

    #[error("Server is already running on {0}")]
    AlreadyRunning(std::net::SocketAddr),

    #[error("Failed to bind to {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a lifecycle hook.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{service}: {source}")]
    Environment {
        service: String,
        #[source]
        source: EnvironmentError,
    },

    #[error("{service}: {source}")]
    Server {
        service: String,
        #[source]
        source: ServerError,
    },
}

impl ServiceError {
    /// Name of the service whose hook failed.
    pub fn service(&self) -> &str {
        match self {
            ServiceError::Environment { service, .. } | ServiceError::Server { service, .. } => {
                service
            }
        }
    }
}
