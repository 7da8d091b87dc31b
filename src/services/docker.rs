use async_trait::async_trait;

use crate::environment::EnvironmentOrchestrator;
use crate::error::ServiceError;
use crate::services::LifecycleService;

/// Brings the Docker stack up before tests and removes it afterwards.
pub struct DockerService {
    orchestrator: EnvironmentOrchestrator,
}

impl DockerService {
    pub fn new(orchestrator: EnvironmentOrchestrator) -> Self {
        Self { orchestrator }
    }

    fn wrap(&self, source: crate::error::EnvironmentError) -> ServiceError {
        ServiceError::Environment {
            service: self.name().to_string(),
            source,
        }
    }
}

#[async_trait]
impl LifecycleService for DockerService {
    fn name(&self) -> &str {
        "docker"
    }

    async fn on_prepare(&self) -> Result<(), ServiceError> {
        self.orchestrator.prepare().await.map_err(|e| self.wrap(e))
    }

    async fn on_complete(&self) -> Result<(), ServiceError> {
        self.orchestrator.complete().await.map_err(|e| self.wrap(e))
    }
}
