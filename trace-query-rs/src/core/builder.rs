//! Client builder implementation
//!
//! Shared HTTP settings for the metadata and generation clients.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client as ReqwestClient;

use crate::error::{Result, TranslateError};
use crate::services::UserAgent;

/// Unified builder for the crate's HTTP clients
pub struct ClientBuilder {
    /// Custom headers to include with all requests
    custom_headers: HashMap<String, String>,

    /// Fallback timeout; individual requests set their own
    timeout: Option<Duration>,

    /// User agent
    user_agent: UserAgent,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            custom_headers: HashMap::new(),
            timeout: Some(Duration::from_secs(30)),
            user_agent: UserAgent::default(),
        }
    }
}

impl ClientBuilder {
    /// Create a new client builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a custom header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.insert(key.into(), value.into());
        self
    }

    /// Set the fallback request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, user_agent: UserAgent) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Build an HTTP client with the configured settings
    pub fn build_http_client(&self) -> Result<ReqwestClient> {
        let mut builder = ReqwestClient::builder();

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        builder = builder.user_agent(self.user_agent.to_string());

        let mut headers = HeaderMap::new();
        for (key, value) in &self.custom_headers {
            let header_name = HeaderName::from_str(key).map_err(|e| {
                TranslateError::configuration(format!("Invalid header name: {}", e))
            })?;

            let header_value = HeaderValue::from_str(value).map_err(|e| {
                TranslateError::configuration(format!("Invalid header value: {}", e))
            })?;

            headers.insert(header_name, header_value);
        }

        builder = builder.default_headers(headers);

        builder.build().map_err(|e| {
            TranslateError::configuration(format!("Failed to build HTTP client: {}", e))
        })
    }
}
