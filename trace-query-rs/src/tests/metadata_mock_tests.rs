//! Mock tests for the trace-metadata client
//!
//! These tests use WireMock to simulate the metadata API.

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::MetadataConfig;
    use crate::core::MetadataSource;
    use crate::error::ErrorKind;
    use crate::services::jaeger::MetadataClient;

    fn create_test_client(mock_server: &MockServer) -> MetadataClient {
        MetadataClient::new_with_config(MetadataConfig {
            base_url: format!("{}/api", mock_server.uri()),
            timeout_seconds: 1,
        })
        .expect("Failed to build metadata client")
    }

    #[tokio::test]
    async fn test_list_services() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/services"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": ["auth-service", "payment"],
                "total": 2,
                "limit": 0,
                "offset": 0,
                "errors": null
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let services = client.list_services().await.unwrap();

        assert_eq!(services, vec!["auth-service", "payment"]);
    }

    #[tokio::test]
    async fn test_list_operations_both_shapes() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/services/auth-service/operations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": ["/v1/login", "/v1/logout"]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/services/payment/operations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "name": "charge", "spanKind": "server" },
                    { "name": "refund", "spanKind": "" }
                ]
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);

        assert_eq!(
            client.list_operations("auth-service").await.unwrap(),
            vec!["/v1/login", "/v1/logout"]
        );
        assert_eq!(
            client.list_operations("payment").await.unwrap(),
            vec!["charge", "refund"]
        );
    }

    #[tokio::test]
    async fn test_null_data_is_empty() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/services"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": null })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert!(client.list_services().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_metadata_fetch() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/services"))
            .respond_with(ResponseTemplate::new(503).set_body_string("storage unavailable"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let err = client.list_services().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MetadataFetch);
        assert_eq!(err.status_code(), Some(503));
        assert_eq!(err.endpoint(), Some("/api/services"));
        assert_eq!(err.remote_name(), Some("jaeger"));
        assert!(err.to_string().contains("storage unavailable"));
    }

    #[tokio::test]
    async fn test_unexpected_body_is_metadata_fetch() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/services"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let err = client.list_services().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MetadataFetch);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_metadata_fetch() {
        let mock_server = MockServer::start().await;
        let client = create_test_client(&mock_server);
        drop(mock_server);

        let err = client.list_services().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MetadataFetch);
    }
}
