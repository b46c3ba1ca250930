//! Transport for index documents
//!
//! The sink only knows the `Shipper` trait; `HttpShipper` is the production
//! implementation posting to an Elasticsearch-compatible `_doc` endpoint.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::infrastructure::config::TelemetryConfig;

/// Failures while shipping a log event. Never surfaced to request handling.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid telemetry config: {0}")]
    InvalidConfig(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("failed to serialize log event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("backend rejected document with status {0}")]
    Rejected(u16),
}

/// Delivers one serialized document to the backend
#[async_trait]
pub trait Shipper: Send + Sync {
    async fn ship(&self, document: String) -> Result<(), TelemetryError>;
}

/// POSTs documents to `{backend_url}/{index_name}/_doc`
#[derive(Debug, Clone)]
pub struct HttpShipper {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpShipper {
    pub fn new(backend_url: &str, index_name: &str, send_timeout: Duration) -> Result<Self, TelemetryError> {
        let endpoint = document_endpoint(backend_url, index_name)?;
        let client = reqwest::Client::builder()
            .timeout(send_timeout)
            .connect_timeout(send_timeout)
            .build()
            .map_err(|e| TelemetryError::Client(e.to_string()))?;

        Ok(Self { client, endpoint })
    }

    pub fn from_config(config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        Self::new(&config.backend_url, &config.index_name, config.send_timeout())
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Shipper for HttpShipper {
    async fn ship(&self, document: String) -> Result<(), TelemetryError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(document)
            .send()
            .await
            .map_err(|e| TelemetryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}

/// Build the `_doc` endpoint, tolerating a trailing slash on the base URL
fn document_endpoint(backend_url: &str, index_name: &str) -> Result<Url, TelemetryError> {
    let index = index_name.trim().trim_matches('/');
    if index.is_empty() {
        return Err(TelemetryError::InvalidConfig("index name is empty".into()));
    }

    let raw = format!("{}/{}/_doc", backend_url.trim_end_matches('/'), index);
    Url::parse(&raw).map_err(|e| TelemetryError::InvalidConfig(format!("{}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let shipper = HttpShipper::from_config(&TelemetryConfig::default()).unwrap();
        assert_eq!(
            shipper.endpoint().as_str(),
            "http://localhost:9200/application-logs/_doc"
        );
    }

    #[test]
    fn test_trailing_slash() {
        let url = document_endpoint("http://es:9200/", "logs").unwrap();
        assert_eq!(url.as_str(), "http://es:9200/logs/_doc");
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(matches!(
            document_endpoint("::nope::", "logs"),
            Err(TelemetryError::InvalidConfig(_))
        ));
        assert!(matches!(
            document_endpoint("http://es:9200", " / "),
            Err(TelemetryError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let shipper =
            HttpShipper::new("http://127.0.0.1:1", "logs", Duration::from_millis(500)).unwrap();
        let result = shipper.ship("{}".to_string()).await;
        assert!(matches!(result, Err(TelemetryError::Transport(_))));
    }
}
