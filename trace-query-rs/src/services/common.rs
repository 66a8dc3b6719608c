//! Common utilities for the remote clients

use std::fmt;

use crate::error::mapping::describe_http_error;

/// UserAgent structure for identifying the client to upstream services
#[derive(Debug, Clone)]
pub struct UserAgent {
    /// Application name
    pub app_name: String,

    /// Version string
    pub version: String,

    /// Optional extra info
    pub extra: Option<String>,
}

impl Default for UserAgent {
    fn default() -> Self {
        Self {
            app_name: "Phoenix-ORCH".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            extra: Some("trace-query".to_string()),
        }
    }
}

impl UserAgent {
    /// Default agent tagged with the name of one client
    pub fn for_client(client: &str) -> Self {
        Self {
            extra: Some(format!("trace-query; {}", client)),
            ..Self::default()
        }
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app_name, self.version)?;

        if let Some(ref extra) = self.extra {
            write!(f, " ({})", extra)?;
        }

        Ok(())
    }
}

/// Join a base URL and a path without doubling or dropping the slash
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Read a non-2xx response into an error detail string
pub async fn describe_error_response(response: reqwest::Response) -> String {
    let status = response.status();

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => format!("failed to read error response: {}", e),
    };

    describe_http_error(status, &body)
}
