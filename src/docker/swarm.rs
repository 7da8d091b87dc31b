//! Single-node swarm initialization.

use std::sync::Arc;

use serde::Deserialize;

use crate::docker::cli::DockerCli;
use crate::error::EnvironmentError;
use crate::exec::CommandRunner;

/// Swarm membership state of the local Docker node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalNodeState {
    Inactive,
    Pending,
    Active,
    Error,
    Locked,
    #[serde(other)]
    Unknown,
}

/// The subset of `docker info` describing the swarm.
#[derive(Debug, Clone, Deserialize)]
pub struct SwarmInfo {
    #[serde(rename = "LocalNodeState")]
    pub local_node_state: LocalNodeState,
    #[serde(rename = "NodeID", default)]
    pub node_id: String,
}

impl SwarmInfo {
    pub fn is_active(&self) -> bool {
        self.local_node_state == LocalNodeState::Active
    }
}

/// What [`SwarmInitializer::ensure_cluster_active`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterOutcome {
    AlreadyActive,
    Initialized,
}

/// Makes sure the local node is part of an active swarm.
pub struct SwarmInitializer {
    runner: Arc<dyn CommandRunner>,
    docker: DockerCli,
    advertise_addr: Option<String>,
}

impl SwarmInitializer {
    pub fn new(runner: Arc<dyn CommandRunner>, docker: DockerCli) -> Self {
        Self {
            runner,
            docker,
            advertise_addr: None,
        }
    }

    /// Pass `--advertise-addr` to `docker swarm init`.
    pub fn with_advertise_addr(mut self, addr: impl Into<String>) -> Self {
        self.advertise_addr = Some(addr.into());
        self
    }

    /// Query the current swarm state.
    pub async fn swarm_info(&self) -> Result<SwarmInfo, EnvironmentError> {
        let command = self.docker.swarm_info();
        let output = self.runner.run(&command).await?;
        serde_json::from_str(output.stdout.trim()).map_err(|e| EnvironmentError::InvalidOutput {
            command,
            reason: e.to_string(),
        })
    }

    /// Initialize a single-node swarm unless one is already active.
    pub async fn ensure_cluster_active(&self) -> Result<ClusterOutcome, EnvironmentError> {
        tracing::info!("Initializing docker swarm");

        let info = self.swarm_info().await?;
        if info.is_active() {
            tracing::debug!(node_id = %info.node_id, "Swarm already active");
            return Ok(ClusterOutcome::AlreadyActive);
        }

        tracing::debug!(state = ?info.local_node_state, "Swarm not active, running init");
        self.runner
            .run(&self.docker.swarm_init(self.advertise_addr.as_deref()))
            .await?;

        tracing::info!("Docker swarm initialized");
        Ok(ClusterOutcome::Initialized)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::ScriptedRunner;

    const ACTIVE: &str = r#"{"NodeID":"abc123","LocalNodeState":"active","ControlAvailable":true}"#;
    const INACTIVE: &str = r#"{"NodeID":"","LocalNodeState":"inactive","ControlAvailable":false}"#;

    fn initializer(runner: &Arc<ScriptedRunner>) -> SwarmInitializer {
        SwarmInitializer::new(runner.clone(), DockerCli::default())
    }

    #[tokio::test]
    async fn test_active_swarm_skips_init() {
        let runner = Arc::new(ScriptedRunner::new().ok("docker info", ACTIVE));

        let outcome = initializer(&runner).ensure_cluster_active().await.unwrap();

        assert_eq!(outcome, ClusterOutcome::AlreadyActive);
        assert_eq!(runner.count("docker swarm init"), 0);
    }

    #[tokio::test]
    async fn test_inactive_swarm_inits_once() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .ok("docker info", INACTIVE)
                .ok("docker swarm init", "Swarm initialized"),
        );

        let outcome = initializer(&runner).ensure_cluster_active().await.unwrap();

        assert_eq!(outcome, ClusterOutcome::Initialized);
        assert_eq!(runner.count("docker swarm init"), 1);
    }

    #[tokio::test]
    async fn test_init_failure_is_command_error() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .ok("docker info", INACTIVE)
                .fail("docker swarm init", "could not choose an IP address"),
        );

        let err = initializer(&runner).ensure_cluster_active().await.unwrap_err();
        assert!(matches!(err, EnvironmentError::Command(_)));
    }

    #[tokio::test]
    async fn test_advertise_addr_is_passed() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .ok("docker info", INACTIVE)
                .ok("docker swarm init", ""),
        );

        initializer(&runner)
            .with_advertise_addr("192.168.1.10")
            .ensure_cluster_active()
            .await
            .unwrap();

        assert_eq!(
            runner.calls().last().map(String::as_str),
            Some("docker swarm init --advertise-addr 192.168.1.10")
        );
    }

    #[tokio::test]
    async fn test_garbage_info_is_invalid_output() {
        let runner = Arc::new(ScriptedRunner::new().ok("docker info", "Cannot connect"));

        let err = initializer(&runner).ensure_cluster_active().await.unwrap_err();
        assert!(matches!(err, EnvironmentError::InvalidOutput { .. }));
        assert_eq!(runner.count("docker swarm init"), 0);
    }

    #[test]
    fn test_unknown_state_parses() {
        let info: SwarmInfo =
            serde_json::from_str(r#"{"LocalNodeState":"draining"}"#).unwrap();
        assert_eq!(info.local_node_state, LocalNodeState::Unknown);
        assert!(!info.is_active());
    }
}
