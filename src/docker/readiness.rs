//! Service readiness probes.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::error::PredicateError;

/// Asks the deployed service whether it can accept traffic.
#[async_trait]
pub trait ReadinessCheck: Send + Sync {
    /// Short description for logs.
    fn describe(&self) -> String;

    /// `Ok(true)` once the service reports ready.
    async fn check(&self) -> Result<bool, PredicateError>;
}

/// WebDriver-style status document: `{"value": {"ready": bool, ...}}`.
#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub value: StatusValue,
}

#[derive(Debug, Deserialize)]
pub struct StatusValue {
    pub ready: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Parse a status body and return its readiness flag.
pub fn parse_status(body: &str) -> Result<bool, PredicateError> {
    let status: StatusResponse =
        serde_json::from_str(body).map_err(|e| PredicateError::Malformed(e.to_string()))?;
    if let Some(message) = status.value.message.as_deref() {
        tracing::trace!(ready = status.value.ready, detail = message, "Status response");
    }
    Ok(status.value.ready)
}

/// Polls an HTTP status endpoint.
pub struct HttpStatusCheck {
    url: Url,
    client: reqwest::Client,
}

impl HttpStatusCheck {
    pub fn new(url: Url) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { url, client }
    }
}

#[async_trait]
impl ReadinessCheck for HttpStatusCheck {
    fn describe(&self) -> String {
        self.url.to_string()
    }

    async fn check(&self) -> Result<bool, PredicateError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| PredicateError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PredicateError::UnexpectedStatus(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PredicateError::Http(e.to_string()))?;
        parse_status(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ready() {
        assert!(parse_status(r#"{"value":{"ready":true,"message":"Selenium Grid ready."}}"#).unwrap());
        assert!(!parse_status(r#"{"value":{"ready":false}}"#).unwrap());
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            parse_status("<html>502 Bad Gateway</html>"),
            Err(PredicateError::Malformed(_))
        ));
        assert!(matches!(
            parse_status(r#"{"value":{}}"#),
            Err(PredicateError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_http_error() {
        // Port 9 (discard) is closed on any sane test host.
        let check = HttpStatusCheck::new(Url::parse("http://127.0.0.1:9/status").unwrap());
        assert!(matches!(check.check().await, Err(PredicateError::Http(_))));
    }
}
