use async_trait::async_trait;

use crate::config::SiteConfig;
use crate::error::ServiceError;
use crate::server::StaticServer;
use crate::services::LifecycleService;

/// Serves the site under test for the duration of the run.
///
/// Without a site configuration both hooks only log and succeed.
pub struct StaticSiteService {
    server: Option<StaticServer>,
}

impl StaticSiteService {
    pub fn new(config: Option<SiteConfig>) -> Self {
        Self {
            server: config.map(StaticServer::new),
        }
    }

    pub fn server(&self) -> Option<&StaticServer> {
        self.server.as_ref()
    }
}

#[async_trait]
impl LifecycleService for StaticSiteService {
    fn name(&self) -> &str {
        "static-site"
    }

    async fn on_prepare(&self) -> Result<(), ServiceError> {
        let Some(server) = &self.server else {
            tracing::warn!("No site directory configured, static server not started");
            return Ok(());
        };
        server
            .start()
            .await
            .map(|_| ())
            .map_err(|source| ServiceError::Server {
                service: self.name().to_string(),
                source,
            })
    }

    async fn on_complete(&self) -> Result<(), ServiceError> {
        if let Some(server) = &self.server {
            server.stop().await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_is_noop() {
        let service = StaticSiteService::new(None);
        service.on_prepare().await.unwrap();
        service.on_complete().await.unwrap();
        assert!(service.server().is_none());
    }

    #[tokio::test]
    async fn test_missing_root_fails_prepare() {
        let service = StaticSiteService::new(Some(SiteConfig {
            dir: "/nonexistent/site".into(),
            port: 0,
            host: "127.0.0.1".to_string(),
            ..Default::default()
        }));
        let err = service.on_prepare().await.unwrap_err();
        assert_eq!(err.service(), "static-site");
    }
}
