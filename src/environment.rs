//! Environment lifecycle facade.
//!
//! `prepare()` walks `Uninitialized → ClusterActive → StackDeployed →
//! ServiceReady`; `complete()` walks `StackRemoving → NetworkClear`. Each
//! step runs only after the previous one succeeded, and every decision
//! re-queries Docker rather than trusting earlier observations.
//!
//! Callers must not run `prepare()`/`complete()` concurrently for the same
//! stack; nothing here serializes them.

use std::sync::Arc;

use crate::config::DockerConfig;
use crate::docker::{
    ClusterOutcome, DockerCli, HttpStatusCheck, ReadinessCheck, StackDescriptor, StackManager,
    SwarmInitializer,
};
use crate::error::EnvironmentError;
use crate::exec::{CommandRunner, ShellRunner};

pub struct EnvironmentOrchestrator {
    swarm: SwarmInitializer,
    stacks: StackManager,
    descriptor: StackDescriptor,
}

impl EnvironmentOrchestrator {
    pub fn new(swarm: SwarmInitializer, stacks: StackManager, descriptor: StackDescriptor) -> Self {
        Self {
            swarm,
            stacks,
            descriptor,
        }
    }

    /// Wire the orchestrator against the real Docker CLI and status endpoint.
    pub fn from_config(config: &DockerConfig) -> Self {
        let mut runner = ShellRunner::new();
        if let Some(timeout) = config.command_timeout {
            runner = runner.with_timeout(timeout);
        }
        let readiness = Arc::new(HttpStatusCheck::new(config.status_url.clone()));
        Self::with_collaborators(config, Arc::new(runner), readiness)
    }

    /// Same wiring as [`from_config`](Self::from_config) with injected seams.
    pub fn with_collaborators(
        config: &DockerConfig,
        runner: Arc<dyn CommandRunner>,
        readiness: Arc<dyn ReadinessCheck>,
    ) -> Self {
        let docker = DockerCli::new(&config.binary);

        let mut swarm = SwarmInitializer::new(Arc::clone(&runner), docker.clone());
        if let Some(addr) = &config.advertise_addr {
            swarm = swarm.with_advertise_addr(addr);
        }

        let stacks =
            StackManager::new(runner, docker, readiness).with_polling(config.poll_settings());

        Self::new(swarm, stacks, config.descriptor())
    }

    pub fn descriptor(&self) -> &StackDescriptor {
        &self.descriptor
    }

    /// Bring the environment up. Any failure aborts the remaining steps.
    pub async fn prepare(&self) -> Result<(), EnvironmentError> {
        let outcome = self.swarm.ensure_cluster_active().await?;
        if outcome == ClusterOutcome::Initialized {
            tracing::debug!("Swarm created for this run");
        }

        self.stacks.deploy(&self.descriptor).await?;

        tracing::info!(stack = self.descriptor.name(), "Environment ready");
        Ok(())
    }

    /// Tear the stack down and wait for its network to be released.
    pub async fn complete(&self) -> Result<(), EnvironmentError> {
        let removed = self.stacks.remove_if_present(&self.descriptor).await?;
        if !removed {
            tracing::info!(stack = self.descriptor.name(), "No stack left to remove");
        }
        Ok(())
    }
}
