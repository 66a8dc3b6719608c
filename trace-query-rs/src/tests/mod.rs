//! Unit tests for the translation pipeline
//!
//! Mock-server tests stand up WireMock instances for the trace-metadata API
//! and the generation endpoint.

pub mod config_tests;
pub mod metadata_mock_tests;

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::{GenerationConfig, MetadataConfig, TranslatorConfig};

/// Install a test logger once; later calls are no-ops
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Configuration pointing both clients at mock servers, with short timeouts
pub fn mock_config(metadata: &MockServer, generation: &MockServer) -> TranslatorConfig {
    TranslatorConfig {
        metadata: MetadataConfig {
            base_url: format!("{}/api", metadata.uri()),
            timeout_seconds: 2,
        },
        generation: GenerationConfig {
            base_url: generation.uri(),
            health_timeout_ms: 300,
            generate_timeout_ms: 1_000,
            ..GenerationConfig::default()
        },
        route_validation: false,
    }
}

/// Mount `GET /api/services` and one operations route per service
pub async fn mount_catalog(server: &MockServer, catalog: &[(&str, &[&str])]) {
    let services: Vec<&str> = catalog.iter().map(|(service, _)| *service).collect();

    Mock::given(method("GET"))
        .and(path("/api/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": services })))
        .mount(server)
        .await;

    for (service, routes) in catalog {
        Mock::given(method("GET"))
            .and(path(format!("/api/services/{}/operations", service)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": routes })))
            .mount(server)
            .await;
    }
}

/// Mount a healthy liveness route
pub async fn mount_healthy(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": [] })))
        .mount(server)
        .await;
}

/// Completion response wrapping `text` the way the generation API does
pub fn completion(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "model": "llama3.2",
        "response": text,
        "done": true,
    }))
}

/// A delay comfortably past the short test timeouts
pub fn past_timeout() -> Duration {
    Duration::from_millis(2_500)
}
