//! Local text-generation client
//!
//! Two calls, each under its own hard timeout:
//! - `check_health`: `GET {base}{health_path}`, fails fast (5s default)
//! - `generate`: `POST {base}{generate_path}` with `stream: false` (30s default)

mod models;
pub use models::*;

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;

use crate::config::{ConfigProvider, GenerationConfig, DEFAULT_PROVIDER};
use crate::core::{ClientBuilder, TextGenerator};
use crate::error::mapping::{classify_http_error, describe_transport_error, http_context};
use crate::error::{Result, TranslateError};
use crate::services::common::{describe_error_response, join_url, UserAgent};
use crate::util::truncate_string;

const REMOTE: &str = "ollama";

/// Generation endpoint client
pub struct GenerationClient {
    http_client: Client,
    config: GenerationConfig,
}

impl GenerationClient {
    /// Create a client from environment configuration
    pub fn from_env() -> Result<Self> {
        let config = GenerationConfig::from_provider(&**DEFAULT_PROVIDER)?;
        Self::new_with_config(config)
    }

    /// Create a client from any config provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        Self::new_with_config(GenerationConfig::from_provider(provider)?)
    }

    /// Create a client with explicit configuration
    pub fn new_with_config(config: GenerationConfig) -> Result<Self> {
        let fallback_timeout = config.health_timeout().max(config.generate_timeout());

        let http_client = ClientBuilder::new()
            .timeout(fallback_timeout)
            .user_agent(UserAgent::for_client(REMOTE))
            .build_http_client()?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Create a new builder for the generation client
    pub fn builder() -> GenerationClientBuilder {
        GenerationClientBuilder::default()
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    fn health_url(&self) -> String {
        join_url(&self.config.base_url, &self.config.health_path)
    }

    fn generate_url(&self) -> String {
        join_url(&self.config.base_url, &self.config.generate_path)
    }
}

#[async_trait]
impl TextGenerator for GenerationClient {
    async fn check_health(&self) -> Result<()> {
        let url = self.health_url();
        let timeout = self.config.health_timeout();
        debug!("Checking generation backend liveness: GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                warn!("Generation backend liveness check failed: {}", e);
                TranslateError::backend_unavailable(describe_transport_error(&e, timeout))
                    .with_context(http_context(REMOTE, &self.config.health_path, None))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = describe_error_response(response).await;
            warn!("Generation backend liveness check returned {}", status);
            return Err(TranslateError::backend_unavailable(detail)
                .with_context(http_context(REMOTE, &self.config.health_path, Some(status))));
        }

        Ok(())
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = self.generate_url();
        let timeout: Duration = self.config.generate_timeout();
        let request = GenerateRequest::new(&self.config.model, prompt);
        debug!(
            "Sending completion request: POST {} (model {}, {} prompt bytes)",
            url,
            self.config.model,
            prompt.len()
        );

        let response = self
            .http_client
            .post(&url)
            .timeout(timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                TranslateError::generation_request(describe_transport_error(&e, timeout))
                    .with_context(http_context(REMOTE, &self.config.generate_path, None))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = describe_error_response(response).await;
            warn!(
                "Completion request rejected ({}): {}",
                classify_http_error(status),
                detail
            );
            return Err(TranslateError::generation_request(detail)
                .with_context(http_context(REMOTE, &self.config.generate_path, Some(status))));
        }

        // A body cut off by the timeout surfaces here as a decode/timeout error
        let body = response.json::<GenerateResponse>().await.map_err(|e| {
            let detail = if e.is_timeout() {
                describe_transport_error(&e, timeout)
            } else {
                format!("unexpected response body: {}", e)
            };
            TranslateError::generation_request(detail)
                .with_context(http_context(REMOTE, &self.config.generate_path, Some(status)))
        })?;

        debug!("Generated text: {}", truncate_string(&body.response, 500));
        Ok(body.response)
    }
}

/// Whole milliseconds, saturating at `u64::MAX`
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Builder for the generation client
#[derive(Default)]
pub struct GenerationClientBuilder {
    base_url: Option<String>,
    model: Option<String>,
    health_timeout: Option<Duration>,
    generate_timeout: Option<Duration>,
}

impl GenerationClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the model name
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the liveness timeout
    pub fn health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = Some(timeout);
        self
    }

    /// Set the completion timeout
    pub fn generate_timeout(mut self, timeout: Duration) -> Self {
        self.generate_timeout = Some(timeout);
        self
    }

    /// Build the generation client on top of the defaults
    pub fn build(self) -> Result<GenerationClient> {
        let mut config = GenerationConfig::default();

        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }

        if let Some(model) = self.model {
            config.model = model;
        }

        if let Some(timeout) = self.health_timeout {
            config.health_timeout_ms = millis(timeout);
        }

        if let Some(timeout) = self.generate_timeout {
            config.generate_timeout_ms = millis(timeout);
        }

        crate::config::ServiceConfig::validate(&config)?;

        GenerationClient::new_with_config(config)
    }
}
