//! Trace-metadata API client
//!
//! Reads service names and per-service operation names from a Jaeger-style
//! query API:
//! - `GET {base}/services` -> `{ "data": [..] }`
//! - `GET {base}/services/{service}/operations` -> `{ "data": [..] }`

mod models;
pub use models::*;

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::{ConfigProvider, MetadataConfig, DEFAULT_PROVIDER};
use crate::core::{ClientBuilder, MetadataSource};
use crate::error::mapping::{describe_transport_error, http_context};
use crate::error::{Result, TranslateError};
use crate::services::common::{describe_error_response, UserAgent};

const REMOTE: &str = "jaeger";

/// Trace-metadata API client
pub struct MetadataClient {
    http_client: Client,
    config: MetadataConfig,
}

impl MetadataClient {
    /// Create a client from environment configuration
    pub fn from_env() -> Result<Self> {
        let config = MetadataConfig::from_provider(&**DEFAULT_PROVIDER)?;
        Self::new_with_config(config)
    }

    /// Create a client from any config provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        Self::new_with_config(MetadataConfig::from_provider(provider)?)
    }

    /// Create a client with explicit configuration
    pub fn new_with_config(config: MetadataConfig) -> Result<Self> {
        // Reject unusable base URLs up front rather than on first fetch
        Self::endpoint_url(&config.base_url, &["services"])?;

        let http_client = ClientBuilder::new()
            .timeout(config.timeout())
            .user_agent(UserAgent::for_client(REMOTE))
            .build_http_client()?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &MetadataConfig {
        &self.config
    }

    fn endpoint_url(base_url: &str, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(base_url).map_err(|e| {
            TranslateError::configuration(format!("Invalid metadata base URL '{}': {}", base_url, e))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                TranslateError::configuration(format!(
                    "Metadata base URL cannot carry a path: {}",
                    base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    async fn fetch<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<DataResponse<T>> {
        let url = Self::endpoint_url(&self.config.base_url, segments)?;
        let endpoint = url.path().to_string();
        let timeout: Duration = self.config.timeout();

        debug!("Sending request to trace metadata API: GET {}", url);

        let response = self
            .http_client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                TranslateError::metadata_fetch(describe_transport_error(&e, timeout))
                    .with_context(http_context(REMOTE, &endpoint, None))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = describe_error_response(response).await;
            return Err(TranslateError::metadata_fetch(detail)
                .with_context(http_context(REMOTE, &endpoint, Some(status))));
        }

        response.json::<DataResponse<T>>().await.map_err(|e| {
            TranslateError::metadata_fetch(format!("unexpected response body: {}", e))
                .with_context(http_context(REMOTE, &endpoint, Some(status)))
        })
    }
}

#[async_trait]
impl MetadataSource for MetadataClient {
    async fn list_services(&self) -> Result<Vec<String>> {
        let response: DataResponse<String> = self.fetch(&["services"]).await?;
        Ok(response.into_data())
    }

    async fn list_operations(&self, service: &str) -> Result<Vec<String>> {
        let response: DataResponse<OperationEntry> =
            self.fetch(&["services", service, "operations"]).await?;

        Ok(response
            .into_data()
            .into_iter()
            .map(OperationEntry::into_name)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_encodes_service() {
        let url = MetadataClient::endpoint_url(
            "http://localhost:16686/api/",
            &["services", "checkout/v2", "operations"],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:16686/api/services/checkout%2Fv2/operations"
        );
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let config = MetadataConfig {
            base_url: "not a url".to_string(),
            ..MetadataConfig::default()
        };
        assert!(MetadataClient::new_with_config(config).is_err());
    }

    #[test]
    fn test_operation_entry_shapes() {
        let legacy: DataResponse<OperationEntry> =
            serde_json::from_str(r#"{"data":["/v1/login","GET /health"]}"#).unwrap();
        let detailed: DataResponse<OperationEntry> = serde_json::from_str(
            r#"{"data":[{"name":"/v1/login","spanKind":"server"}],"total":1}"#,
        )
        .unwrap();
        let empty: DataResponse<OperationEntry> = serde_json::from_str(r#"{"data":null}"#).unwrap();

        let names: Vec<String> = legacy.into_data().into_iter().map(OperationEntry::into_name).collect();
        assert_eq!(names, vec!["/v1/login", "GET /health"]);
        assert_eq!(detailed.into_data()[0].clone().into_name(), "/v1/login");
        assert!(empty.into_data().is_empty());
    }
}
