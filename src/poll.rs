//! Bounded-retry polling.
//!
//! Turns eventually-consistent external state (a network going away, a
//! service reporting ready) into a single success or [`TimeoutError`].
//! A probe that errors counts as a failed attempt; only running out of
//! attempts is fatal.

use std::future::Future;
use std::time::Duration;

use crate::error::{PredicateError, TimeoutError};
use crate::exec::{CommandOutput, CommandRunner};

/// One bounded polling operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSpec {
    /// What is being waited on; used in logs and in the timeout error.
    pub operation: String,
    /// Total probe attempts before giving up.
    pub max_attempts: u32,
    /// Idle wait between attempts.
    pub interval: Duration,
}

impl PollSpec {
    pub fn new(operation: impl Into<String>, max_attempts: u32, interval: Duration) -> Self {
        Self {
            operation: operation.into(),
            max_attempts,
            interval,
        }
    }
}

/// Run `probe` until it reports success or the attempt budget is spent.
///
/// Returns the number of attempts it took. After the last failed attempt
/// the loop stops immediately: no further probe runs and no wait happens.
pub async fn poll<F, Fut>(spec: &PollSpec, mut probe: F) -> Result<u32, TimeoutError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, PredicateError>>,
{
    for attempt in 1..=spec.max_attempts {
        match probe().await {
            Ok(true) => {
                tracing::debug!(operation = %spec.operation, attempt, "Poll succeeded");
                return Ok(attempt);
            }
            Ok(false) => {
                tracing::trace!(operation = %spec.operation, attempt, "Poll condition not met");
            }
            Err(e) => {
                tracing::debug!(operation = %spec.operation, attempt, error = %e, "Poll attempt failed");
            }
        }

        if attempt < spec.max_attempts {
            tokio::time::sleep(spec.interval).await;
        }
    }

    Err(TimeoutError {
        operation: spec.operation.clone(),
        attempts: spec.max_attempts,
    })
}

/// Poll by running `command` and evaluating `predicate` on its output.
///
/// A command that fails to run or exits non-zero is a failed attempt.
pub async fn poll_command<P>(
    runner: &dyn CommandRunner,
    spec: &PollSpec,
    command: &str,
    predicate: P,
) -> Result<u32, TimeoutError>
where
    P: Fn(&CommandOutput) -> Result<bool, PredicateError>,
{
    let predicate = &predicate;
    poll(spec, || async move {
        let output = runner.run(command).await?;
        predicate(&output)
    })
    .await
}
