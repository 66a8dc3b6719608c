//! Translation target and caller hints

use serde::{Deserialize, Serialize};

/// Default number of traces a search returns
pub const DEFAULT_LIMIT: u32 = 100;

/// Lookback used when the model suggests an unusable one
pub const DEFAULT_LOOKBACK: &str = "1h";

/// A validated trace search, ready for the trace query API.
///
/// Values are only produced by `QueryValidator::normalize`, so every field
/// present has passed its format rule and `limit` is always positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredQuery {
    /// One of the catalog's service names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,

    /// Exact operation name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,

    /// Space-separated `key=value` pairs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,

    /// `^[0-9]+[hdms]$`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookback: Option<String>,

    pub limit: u32,

    /// `^[0-9]+(\.[0-9]+)?[hdms]$`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_duration: Option<String>,

    /// `^[0-9]+(\.[0-9]+)?[hdms]$`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<String>,
}

impl Default for StructuredQuery {
    fn default() -> Self {
        Self {
            service: None,
            operation: None,
            tags: None,
            lookback: None,
            limit: DEFAULT_LIMIT,
            min_duration: None,
            max_duration: None,
        }
    }
}

impl StructuredQuery {
    /// Render the query as ordered search parameters, skipping absent fields
    pub fn to_search_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();

        if let Some(ref service) = self.service {
            params.push(("service", service.clone()));
        }
        if let Some(ref operation) = self.operation {
            params.push(("operation", operation.clone()));
        }
        if let Some(ref tags) = self.tags {
            params.push(("tags", tags.clone()));
        }
        if let Some(ref lookback) = self.lookback {
            params.push(("lookback", lookback.clone()));
        }
        params.push(("limit", self.limit.to_string()));
        if let Some(ref min) = self.min_duration {
            params.push(("minDuration", min.clone()));
        }
        if let Some(ref max) = self.max_duration {
            params.push(("maxDuration", max.clone()));
        }

        params
    }

    /// Iterate the `key=value` pairs of `tags`
    pub fn tag_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags
            .as_deref()
            .unwrap_or("")
            .split_whitespace()
            .filter_map(|pair| pair.split_once('='))
    }
}

/// Optional hint supplied alongside the free-text query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationContext {
    /// Service already picked in the search form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_service: Option<String>,
}

impl TranslationContext {
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            selected_service: Some(service.into()),
        }
    }

    /// The selected service, ignoring blank values
    pub fn service(&self) -> Option<&str> {
        self.selected_service
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_camel_case_and_skips_absent() {
        let query = StructuredQuery {
            service: Some("payment".to_string()),
            lookback: Some("2h".to_string()),
            min_duration: Some("1s".to_string()),
            ..StructuredQuery::default()
        };

        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({"service": "payment", "lookback": "2h", "minDuration": "1s", "limit": 100})
        );
    }

    #[test]
    fn test_search_params_order() {
        let query = StructuredQuery {
            service: Some("auth-service".to_string()),
            tags: Some("error=true".to_string()),
            max_duration: Some("2.5s".to_string()),
            limit: 20,
            ..StructuredQuery::default()
        };

        let params = query.to_search_params();
        let keys: Vec<&str> = params.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["service", "tags", "limit", "maxDuration"]);
        assert_eq!(params[2].1, "20");
    }

    #[test]
    fn test_context_ignores_blank_service() {
        assert_eq!(TranslationContext::with_service("  ").service(), None);
        assert_eq!(TranslationContext::with_service("cart").service(), Some("cart"));
        assert_eq!(TranslationContext::default().service(), None);
    }
}
