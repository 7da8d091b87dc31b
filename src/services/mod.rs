//! Test-runner lifecycle services.
//!
//! A test runner calls `on_prepare` once before any test executes and
//! `on_complete` once after all tests finished. [`ServiceManager`] runs a
//! list of services through those hooks:
//! - prepare runs in registration order and stops at the first failure
//! - complete runs in reverse order, visits every service, and only
//!   reports failures so cleanup problems never overturn test results

mod docker;
mod static_site;

pub use docker::DockerService;
pub use static_site::StaticSiteService;

use async_trait::async_trait;

use crate::error::ServiceError;

/// Hooks invoked around a test run.
#[async_trait]
pub trait LifecycleService: Send + Sync {
    /// Service name used in logs and errors.
    fn name(&self) -> &str;

    /// Called once before any test executes.
    async fn on_prepare(&self) -> Result<(), ServiceError>;

    /// Called once after all tests finished, even if prepare failed.
    async fn on_complete(&self) -> Result<(), ServiceError>;
}

/// Runs lifecycle hooks for a set of services.
#[derive(Default)]
pub struct ServiceManager {
    services: Vec<Box<dyn LifecycleService>>,
}

impl ServiceManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, service: Box<dyn LifecycleService>) {
        tracing::debug!("Added service: {}", service.name());
        self.services.push(service);
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Prepare every service in order, stopping at the first failure.
    pub async fn prepare_all(&self) -> Result<(), ServiceError> {
        for service in &self.services {
            tracing::info!("Preparing service: {}", service.name());
            service.on_prepare().await.inspect_err(|e| {
                tracing::error!("Failed to prepare service {}: {}", service.name(), e);
            })?;
        }
        Ok(())
    }

    /// Complete every service in reverse order and return the failures.
    pub async fn complete_all(&self) -> Vec<ServiceError> {
        let mut failures = Vec::new();
        for service in self.services.iter().rev() {
            tracing::info!("Completing service: {}", service.name());
            if let Err(e) = service.on_complete().await {
                tracing::warn!("Failed to complete service {}: {}", service.name(), e);
                failures.push(e);
            }
        }
        failures
    }
}
