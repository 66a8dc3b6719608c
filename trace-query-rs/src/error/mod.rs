//! Error handling for trace query translation
//!
//! Every failure of a translation is terminal and reaches the caller as a
//! `TranslateError` with a human-readable message:
//! - one variant per failure the search form can show to a user
//! - optional context (remote, endpoint, HTTP status) for debugging
//! - a `Result` alias used across the crate

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub mod mapping;

/// Result type for translation operations
pub type Result<T> = std::result::Result<T, TranslateError>;

/// Remediation shown whenever the local generation service cannot be reached
pub const BACKEND_REMEDIATION: &str =
    "Make sure the local generation service is installed and running (e.g. `ollama serve`) \
     and that the configured model has been pulled";

/// Main error type for the translation pipeline
#[derive(Error, Debug)]
pub enum TranslateError {
    /// Generation endpoint liveness check failed
    #[error("Generation backend unavailable: {0}. {}", BACKEND_REMEDIATION)]
    BackendUnavailable(String),

    /// The trace-metadata service list could not be fetched
    #[error("Failed to fetch trace metadata: {0}")]
    MetadataFetch(String),

    /// The generation call failed or timed out
    #[error("Generation request failed: {0}")]
    GenerationRequest(String),

    /// No JSON object could be recovered from the generated text
    #[error("Malformed generation response: {0}")]
    MalformedResponse(String),

    /// The generated query names a service the backend does not know
    #[error("Unknown service '{service}'. Valid services: {}", format_services(.valid_services))]
    InvalidService {
        service: String,
        valid_services: Vec<String>,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Errors with additional context
    #[error("{inner}")]
    WithContext {
        inner: Box<TranslateError>,
        context: ErrorContext,
    },
}

fn format_services(services: &[String]) -> String {
    if services.is_empty() {
        "(none)".to_string()
    } else {
        services.join(", ")
    }
}

/// Discriminant of a `TranslateError`, ignoring any attached context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BackendUnavailable,
    MetadataFetch,
    GenerationRequest,
    MalformedResponse,
    InvalidService,
    Configuration,
}

impl TranslateError {
    /// Create a backend unavailable error
    pub fn backend_unavailable(message: impl Into<String>) -> Self {
        TranslateError::BackendUnavailable(message.into())
    }

    /// Create a metadata fetch error
    pub fn metadata_fetch(message: impl Into<String>) -> Self {
        TranslateError::MetadataFetch(message.into())
    }

    /// Create a generation request error
    pub fn generation_request(message: impl Into<String>) -> Self {
        TranslateError::GenerationRequest(message.into())
    }

    /// Create a malformed response error
    pub fn malformed_response(message: impl Into<String>) -> Self {
        TranslateError::MalformedResponse(message.into())
    }

    /// Create an invalid service error; the valid list is sorted for stable messages
    pub fn invalid_service<I, S>(service: impl Into<String>, valid_services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut valid_services: Vec<String> = valid_services.into_iter().map(Into::into).collect();
        valid_services.sort();
        TranslateError::InvalidService {
            service: service.into(),
            valid_services,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        TranslateError::Configuration(message.into())
    }

    /// Add context to an existing error
    pub fn with_context(self, context: ErrorContext) -> Self {
        TranslateError::WithContext {
            inner: Box::new(self),
            context,
        }
    }

    /// Add a single context key/value to an existing error
    pub fn with_context_value(self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        let mut context = ErrorContext::new();
        context.add(key, value);
        self.with_context(context)
    }

    /// The error variant with any context stripped
    pub fn kind(&self) -> ErrorKind {
        match self {
            TranslateError::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            TranslateError::MetadataFetch(_) => ErrorKind::MetadataFetch,
            TranslateError::GenerationRequest(_) => ErrorKind::GenerationRequest,
            TranslateError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            TranslateError::InvalidService { .. } => ErrorKind::InvalidService,
            TranslateError::Configuration(_) => ErrorKind::Configuration,
            TranslateError::WithContext { inner, .. } => inner.kind(),
        }
    }

    /// Name of the remote the error came from, if recorded
    pub fn remote_name(&self) -> Option<&str> {
        match self {
            TranslateError::WithContext { context, inner } => inner
                .remote_name()
                .or_else(|| Some(context.remote.as_str()).filter(|r| *r != "unknown")),
            _ => None,
        }
    }

    /// Translation request ID, if recorded
    pub fn request_id(&self) -> Option<&str> {
        match self {
            TranslateError::WithContext { context, inner } => {
                context.request_id.as_deref().or_else(|| inner.request_id())
            }
            _ => None,
        }
    }

    /// Get the HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TranslateError::WithContext { context, inner } => {
                context.status_code.or_else(|| inner.status_code())
            }
            _ => None,
        }
    }

    /// Get the endpoint that was called, if available
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            TranslateError::WithContext { context, inner } => {
                context.endpoint.as_deref().or_else(|| inner.endpoint())
            }
            _ => None,
        }
    }

    /// Whether resubmitting the same text may succeed.
    ///
    /// Network-side failures and model output problems are transient; a bad
    /// configuration is not.
    pub fn is_transient(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Configuration)
    }
}

/// Error context information
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Remote API that produced the error ("jaeger", "ollama", ...)
    pub remote: String,

    /// Time the error was recorded
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,

    /// HTTP status code if applicable
    pub status_code: Option<u16>,

    /// Translation request ID for log correlation
    pub request_id: Option<String>,

    /// Endpoint that was called
    pub endpoint: Option<String>,

    /// Additional context data
    pub data: HashMap<String, String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            remote: "unknown".to_string(),
            timestamp: Some(chrono::Utc::now()),
            status_code: None,
            request_id: None,
            endpoint: None,
            data: HashMap::new(),
        }
    }
}

impl ErrorContext {
    /// Create a new error context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new error context for a specific remote API
    pub fn for_remote(remote: impl Into<String>) -> Self {
        Self {
            remote: remote.into(),
            ..Self::default()
        }
    }

    /// Add an HTTP status code
    pub fn status_code(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    /// Add a request ID
    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Add an endpoint
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Add a context value
    pub fn add<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: fmt::Display,
    {
        self.data.insert(key.into(), value.to_string());
    }

    /// Add a context value and return self (builder pattern)
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: fmt::Display,
    {
        self.add(key, value);
        self
    }
}

/// Generated text that is not JSON at all
impl From<serde_json::Error> for TranslateError {
    fn from(err: serde_json::Error) -> Self {
        TranslateError::malformed_response(format!("JSON error: {}", err))
    }
}
