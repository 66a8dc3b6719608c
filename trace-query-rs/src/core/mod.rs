//! Core abstractions for the translation pipeline
//!
//! The orchestrator talks to its two network dependencies through these
//! traits so it can be built against the real HTTP clients or against fakes:
//!
//! - `MetadataSource`: service and operation names from the trace backend
//! - `TextGenerator`: liveness check and prompt completion
//! - `ClientBuilder`: builder for the shared HTTP client settings

pub mod builder;
pub use builder::ClientBuilder;

use async_trait::async_trait;

use crate::error::Result;

/// Source of trace-backend service metadata
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// All service names known to the backend
    async fn list_services(&self) -> Result<Vec<String>>;

    /// Operation (route) names recorded for one service
    async fn list_operations(&self, service: &str) -> Result<Vec<String>>;
}

/// Text-completion endpoint
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Fail with `BackendUnavailable` unless the endpoint answers 2xx in time
    async fn check_health(&self) -> Result<()>;

    /// Complete `prompt` in one non-streaming call and return the raw text
    async fn generate(&self, prompt: &str) -> Result<String>;
}
