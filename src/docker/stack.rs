//! Stack deployment and removal.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::docker::cli::DockerCli;
use crate::docker::readiness::ReadinessCheck;
use crate::error::EnvironmentError;
use crate::exec::CommandRunner;
use crate::poll::{PollSpec, poll, poll_command};

/// Which stack to manage and where its compose file lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackDescriptor {
    name: String,
    compose_file: PathBuf,
}

impl StackDescriptor {
    pub fn new(name: impl Into<String>, compose_file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            compose_file: compose_file.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn compose_file(&self) -> &Path {
        &self.compose_file
    }
}

/// Attempt budget and spacing shared by the teardown and readiness polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            interval: Duration::from_millis(1000),
        }
    }
}

impl PollSettings {
    fn spec(&self, operation: impl Into<String>) -> PollSpec {
        PollSpec::new(operation, self.max_attempts, self.interval)
    }
}

/// Deploys and removes a named Docker stack.
///
/// Both operations re-query Docker before acting and are no-ops when the
/// target state already holds.
pub struct StackManager {
    runner: Arc<dyn CommandRunner>,
    docker: DockerCli,
    readiness: Arc<dyn ReadinessCheck>,
    polling: PollSettings,
}

impl StackManager {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        docker: DockerCli,
        readiness: Arc<dyn ReadinessCheck>,
    ) -> Self {
        Self {
            runner,
            docker,
            readiness,
            polling: PollSettings::default(),
        }
    }

    pub fn with_polling(mut self, polling: PollSettings) -> Self {
        self.polling = polling;
        self
    }

    /// Whether a stack named `name` is currently deployed.
    pub async fn stack_exists(&self, name: &str) -> Result<bool, EnvironmentError> {
        let output = self.runner.run(&self.docker.stack_ls()).await?;
        Ok(output.lines().any(|stack| stack == name))
    }

    /// Remove the stack if it exists and wait for its networks to go away.
    ///
    /// A failing `docker stack ls` (for example on a node that is not a swarm
    /// manager) means no stack can be deployed, so it counts as absent.
    /// Returns `true` when a removal actually happened.
    pub async fn remove_if_present(
        &self,
        descriptor: &StackDescriptor,
    ) -> Result<bool, EnvironmentError> {
        let name = descriptor.name();
        let present = match self.stack_exists(name).await {
            Ok(present) => present,
            Err(EnvironmentError::Command(e)) => {
                tracing::debug!(stack = name, error = %e, "Stack listing failed, treating as absent");
                false
            }
            Err(e) => return Err(e),
        };
        if !present {
            tracing::debug!(stack = name, "No stack to remove");
            return Ok(false);
        }

        tracing::info!(stack = name, "Removing docker stack");
        self.runner.run(&self.docker.stack_rm(name)).await?;

        let spec = self.polling.spec("docker network to shut down");
        let attempts = poll_command(
            self.runner.as_ref(),
            &spec,
            &self.docker.stack_networks(name),
            |output| Ok(output.lines().next().is_none()),
        )
        .await?;

        tracing::info!(stack = name, attempts, "Docker stack removed");
        Ok(true)
    }

    /// Deploy the stack from a clean slate and wait until it reports ready.
    pub async fn deploy(&self, descriptor: &StackDescriptor) -> Result<(), EnvironmentError> {
        self.remove_if_present(descriptor).await?;

        let compose_file = descriptor.compose_file();
        if !compose_file.is_file() {
            return Err(EnvironmentError::ComposeFileMissing(
                compose_file.to_path_buf(),
            ));
        }

        tracing::info!(
            stack = descriptor.name(),
            compose_file = %compose_file.display(),
            "Deploying docker stack"
        );
        self.runner
            .run(&self.docker.stack_deploy(compose_file, descriptor.name()))
            .await?;

        self.await_ready(descriptor).await
    }

    async fn await_ready(&self, descriptor: &StackDescriptor) -> Result<(), EnvironmentError> {
        tracing::info!(
            stack = descriptor.name(),
            endpoint = %self.readiness.describe(),
            "Waiting for docker to become ready"
        );

        let spec = self.polling.spec("docker network to be ready");
        let readiness = self.readiness.as_ref();
        let attempts = poll(&spec, || readiness.check()).await?;

        tracing::info!(stack = descriptor.name(), attempts, "Docker stack ready");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::TimeoutError;
    use crate::testing::{ScriptedReadiness, ScriptedRunner};

    const STACK_LS: &str = "docker stack ls";
    const STACK_RM: &str = "docker stack rm";
    const NETWORK_LS: &str = "docker network ls";
    const DEPLOY: &str = "docker stack deploy";

    fn fast() -> PollSettings {
        PollSettings {
            max_attempts: 5,
            interval: Duration::from_millis(1),
        }
    }

    fn manager(runner: &Arc<ScriptedRunner>, readiness: ScriptedReadiness) -> StackManager {
        StackManager::new(runner.clone(), DockerCli::default(), Arc::new(readiness))
            .with_polling(fast())
    }

    fn compose_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "version: '3.7'").unwrap();
        file
    }

    #[tokio::test]
    async fn test_remove_absent_stack_is_noop() {
        let runner = Arc::new(ScriptedRunner::new().ok(STACK_LS, "other\nwdio-legacy\n"));
        let stacks = manager(&runner, ScriptedReadiness::never());

        let removed = stacks
            .remove_if_present(&StackDescriptor::new("wdio", "unused.yml"))
            .await
            .unwrap();

        assert!(!removed);
        assert_eq!(runner.count(STACK_RM), 0);
        assert_eq!(runner.count(NETWORK_LS), 0);
    }

    #[tokio::test]
    async fn test_remove_on_non_manager_is_noop() {
        let runner = Arc::new(ScriptedRunner::new().fallback_fail(
            STACK_LS,
            "Error response from daemon: This node is not a swarm manager.",
        ));
        let stacks = manager(&runner, ScriptedReadiness::never());

        let removed = stacks
            .remove_if_present(&StackDescriptor::new("wdio", "unused.yml"))
            .await
            .unwrap();

        assert!(!removed);
        assert_eq!(runner.count(STACK_RM), 0);
        assert_eq!(runner.count(NETWORK_LS), 0);
    }

    #[tokio::test]
    async fn test_stack_exists_reports_listing_failure() {
        let runner = Arc::new(ScriptedRunner::new().fail(STACK_LS, "not a swarm manager"));
        let stacks = manager(&runner, ScriptedReadiness::never());

        let err = stacks.stack_exists("wdio").await.unwrap_err();
        assert!(matches!(err, EnvironmentError::Command(_)));
    }

    #[tokio::test]
    async fn test_remove_waits_for_network() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .ok(STACK_LS, "wdio\n")
                .ok(STACK_RM, "Removing network wdio_default")
                .ok(NETWORK_LS, "wdio_default\n")
                .ok(NETWORK_LS, "wdio_default\n")
                .ok(NETWORK_LS, ""),
        );
        let stacks = manager(&runner, ScriptedReadiness::never());

        let removed = stacks
            .remove_if_present(&StackDescriptor::new("wdio", "unused.yml"))
            .await
            .unwrap();

        assert!(removed);
        assert_eq!(runner.count(STACK_RM), 1);
        assert_eq!(runner.count(NETWORK_LS), 3);
    }

    #[tokio::test]
    async fn test_remove_twice_issues_one_rm() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .ok(STACK_LS, "wdio\n")
                .ok(STACK_RM, "")
                .ok(NETWORK_LS, "")
                .ok(STACK_LS, ""),
        );
        let stacks = manager(&runner, ScriptedReadiness::never());
        let descriptor = StackDescriptor::new("wdio", "unused.yml");

        assert!(stacks.remove_if_present(&descriptor).await.unwrap());
        assert!(!stacks.remove_if_present(&descriptor).await.unwrap());
        assert_eq!(runner.count(STACK_RM), 1);
    }

    #[tokio::test]
    async fn test_remove_network_timeout_is_fatal() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .ok(STACK_LS, "wdio\n")
                .ok(STACK_RM, "")
                .fallback(NETWORK_LS, "wdio_default\n"),
        );
        let stacks = manager(&runner, ScriptedReadiness::never());

        let err = stacks
            .remove_if_present(&StackDescriptor::new("wdio", "unused.yml"))
            .await
            .unwrap_err();

        match err {
            EnvironmentError::Timeout(TimeoutError { operation, attempts }) => {
                assert_eq!(operation, "docker network to shut down");
                assert_eq!(attempts, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(runner.count(NETWORK_LS), 5);
    }

    #[tokio::test]
    async fn test_deploy_removes_then_creates() {
        let file = compose_file();
        let runner = Arc::new(
            ScriptedRunner::new()
                .ok(STACK_LS, "wdio\n")
                .ok(STACK_RM, "")
                .ok(NETWORK_LS, "")
                .ok(DEPLOY, "Creating service wdio_standalone-chrome"),
        );
        let stacks = manager(&runner, ScriptedReadiness::ready_after(0));

        stacks
            .deploy(&StackDescriptor::new("wdio", file.path()))
            .await
            .unwrap();

        let calls = runner.calls();
        let rm = calls.iter().position(|c| c.starts_with(STACK_RM)).unwrap();
        let deploy = calls.iter().position(|c| c.starts_with(DEPLOY)).unwrap();
        assert!(rm < deploy, "removal must precede deploy: {calls:?}");
        assert_eq!(runner.count(DEPLOY), 1);
    }

    #[tokio::test]
    async fn test_deploy_waits_for_readiness() {
        let file = compose_file();
        let runner = Arc::new(ScriptedRunner::new().ok(STACK_LS, "").ok(DEPLOY, ""));
        let readiness = Arc::new(ScriptedReadiness::ready_after(3));
        let stacks =
            StackManager::new(runner.clone(), DockerCli::default(), readiness.clone())
                .with_polling(fast());

        stacks
            .deploy(&StackDescriptor::new("wdio", file.path()))
            .await
            .unwrap();

        assert_eq!(readiness.checks(), 4);
    }

    #[tokio::test]
    async fn test_deploy_readiness_timeout() {
        let file = compose_file();
        let runner = Arc::new(ScriptedRunner::new().ok(STACK_LS, "").ok(DEPLOY, ""));
        let stacks = manager(&runner, ScriptedReadiness::never());

        let err = stacks
            .deploy(&StackDescriptor::new("wdio", file.path()))
            .await
            .unwrap_err();

        assert!(
            matches!(&err, EnvironmentError::Timeout(t) if t.operation == "docker network to be ready"),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn test_deploy_missing_compose_file() {
        let runner = Arc::new(ScriptedRunner::new().ok(STACK_LS, ""));
        let stacks = manager(&runner, ScriptedReadiness::ready_after(0));

        let err = stacks
            .deploy(&StackDescriptor::new("wdio", "/nonexistent/docker-compose.yml"))
            .await
            .unwrap_err();

        assert!(matches!(err, EnvironmentError::ComposeFileMissing(_)));
        assert_eq!(runner.count(DEPLOY), 0);
    }

    #[tokio::test]
    async fn test_deploy_command_failure_propagates() {
        let file = compose_file();
        let runner = Arc::new(
            ScriptedRunner::new()
                .ok(STACK_LS, "")
                .fail(DEPLOY, "this node is not a swarm manager"),
        );
        let readiness = Arc::new(ScriptedReadiness::ready_after(0));
        let stacks =
            StackManager::new(runner.clone(), DockerCli::default(), readiness.clone())
                .with_polling(fast());

        let err = stacks
            .deploy(&StackDescriptor::new("wdio", file.path()))
            .await
            .unwrap_err();

        assert!(matches!(err, EnvironmentError::Command(_)));
        assert_eq!(readiness.checks(), 0);
    }
}
