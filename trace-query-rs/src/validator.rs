//! Normalization and validation of candidate queries
//!
//! Fields are processed in `POLICY_TABLE` order; later rules may rely on
//! earlier ones (route checks need the resolved service). What happens to an
//! invalid field is decided by the table, not by the individual checks:
//! a bad `lookback` is replaced, a bad duration removed, a bad `service`
//! rejects the whole query.

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::catalog::CatalogSnapshot;
use crate::error::{Result, TranslateError};
use crate::parser::Candidate;
use crate::query::{StructuredQuery, TranslationContext, DEFAULT_LIMIT, DEFAULT_LOOKBACK};

static LOOKBACK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+[hdms]$").expect("lookback pattern is valid"));

static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)?[hdms]$").expect("duration pattern is valid"));

static TAG_PAIR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._-]+=").expect("tag pattern is valid"));

/// Tag key checked against the catalog's routes in route-aware mode
pub const ROUTE_TAG: &str = "http.route";

/// Fields of a candidate query, in the order they are validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryField {
    Limit,
    Service,
    Lookback,
    MinDuration,
    MaxDuration,
    Operation,
    Tags,
}

impl QueryField {
    /// Key of the field in the candidate object
    pub fn key(&self) -> &'static str {
        match self {
            QueryField::Limit => "limit",
            QueryField::Service => "service",
            QueryField::Lookback => "lookback",
            QueryField::MinDuration => "minDuration",
            QueryField::MaxDuration => "maxDuration",
            QueryField::Operation => "operation",
            QueryField::Tags => "tags",
        }
    }
}

/// Value used when a field is replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    Count(u32),
    Text(&'static str),
}

/// What to do with a field that fails its check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnInvalid {
    /// Overwrite silently
    Replace(Fallback),
    /// Drop the field; absence means "no bound"
    Remove,
    /// Fail the whole translation
    Reject,
    /// Keep the valid parts, clear the field when none survive
    Filter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPolicy {
    pub field: QueryField,
    pub on_invalid: OnInvalid,
    /// Absence is handled like an invalid value
    pub required: bool,
}

/// Severity of each field's failure, in processing order
pub const POLICY_TABLE: [FieldPolicy; 7] = [
    FieldPolicy {
        field: QueryField::Limit,
        on_invalid: OnInvalid::Replace(Fallback::Count(DEFAULT_LIMIT)),
        required: true,
    },
    FieldPolicy {
        field: QueryField::Service,
        on_invalid: OnInvalid::Reject,
        required: false,
    },
    FieldPolicy {
        field: QueryField::Lookback,
        on_invalid: OnInvalid::Replace(Fallback::Text(DEFAULT_LOOKBACK)),
        required: false,
    },
    FieldPolicy {
        field: QueryField::MinDuration,
        on_invalid: OnInvalid::Remove,
        required: false,
    },
    FieldPolicy {
        field: QueryField::MaxDuration,
        on_invalid: OnInvalid::Remove,
        required: false,
    },
    FieldPolicy {
        field: QueryField::Operation,
        on_invalid: OnInvalid::Remove,
        required: false,
    },
    FieldPolicy {
        field: QueryField::Tags,
        on_invalid: OnInvalid::Filter,
        required: false,
    },
];

/// Look up the policy for one field
pub fn policy_for(field: QueryField) -> FieldPolicy {
    POLICY_TABLE
        .iter()
        .copied()
        .find(|policy| policy.field == field)
        .unwrap_or(FieldPolicy {
            field,
            on_invalid: OnInvalid::Remove,
            required: false,
        })
}

/// How operations are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// `operation` is an exact operation name and is passed through
    #[default]
    OperationName,

    /// `operation` is folded into `tags` as `http.route=<path>`, and
    /// `http.route` pairs must name a known route of the resolved service
    RouteAware,
}

/// Outcome of checking one field
enum Check<T> {
    Absent,
    Valid(T),
    Invalid(String),
}

/// Turns parsed candidates into validated `StructuredQuery` values
#[derive(Debug, Clone, Default)]
pub struct QueryValidator {
    mode: ValidationMode,
}

impl QueryValidator {
    pub fn new(mode: ValidationMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Normalize `candidate` against `catalog`.
    ///
    /// Returns either a fully validated query or the first rejection.
    pub fn normalize(
        &self,
        candidate: &Candidate,
        catalog: &CatalogSnapshot,
        context: Option<&TranslationContext>,
    ) -> Result<StructuredQuery> {
        let mut query = StructuredQuery::default();
        let mut pending_route: Option<String> = None;

        for policy in POLICY_TABLE.iter() {
            let raw = candidate.get(policy.field.key()).filter(|v| !v.is_null());

            match policy.field {
                QueryField::Limit => {
                    query.limit = match self.resolve(policy, check_limit(raw))? {
                        Some(limit) => limit,
                        None => DEFAULT_LIMIT,
                    };
                }
                QueryField::Service => {
                    query.service = self.resolve_service(policy, raw, catalog)?;
                }
                QueryField::Lookback => {
                    query.lookback = self.resolve(policy, check_pattern(raw, &LOOKBACK_RE))?;
                }
                QueryField::MinDuration => {
                    query.min_duration = self.resolve(policy, check_pattern(raw, &DURATION_RE))?;
                }
                QueryField::MaxDuration => {
                    query.max_duration = self.resolve(policy, check_pattern(raw, &DURATION_RE))?;
                }
                QueryField::Operation => {
                    let operation = self.resolve(policy, check_operation(raw))?;
                    match self.mode {
                        ValidationMode::OperationName => query.operation = operation,
                        ValidationMode::RouteAware => pending_route = operation,
                    }
                }
                QueryField::Tags => {
                    let route_service = query
                        .service
                        .as_deref()
                        .or_else(|| context.and_then(TranslationContext::service));

                    query.tags = self.filter_tags(raw, pending_route.take(), route_service, catalog);
                }
            }
        }

        Ok(query)
    }

    /// Apply the policy's remedy to a checked value
    fn resolve<T: FromFallback>(&self, policy: &FieldPolicy, check: Check<T>) -> Result<Option<T>> {
        let invalid = match check {
            Check::Valid(value) => return Ok(Some(value)),
            Check::Absent if !policy.required => return Ok(None),
            Check::Absent => None,
            Check::Invalid(raw) => Some(raw),
        };

        match policy.on_invalid {
            OnInvalid::Replace(fallback) => {
                if let Some(ref raw) = invalid {
                    warn!(
                        "Replacing invalid {} '{}' with {:?}",
                        policy.field.key(),
                        raw,
                        fallback
                    );
                }
                Ok(T::from_fallback(fallback))
            }
            OnInvalid::Remove | OnInvalid::Filter => {
                if let Some(ref raw) = invalid {
                    debug!("Dropping invalid {} '{}'", policy.field.key(), raw);
                }
                Ok(None)
            }
            OnInvalid::Reject => Err(TranslateError::malformed_response(format!(
                "invalid {}: {}",
                policy.field.key(),
                invalid.unwrap_or_else(|| "missing".to_string())
            ))),
        }
    }

    fn resolve_service(
        &self,
        policy: &FieldPolicy,
        raw: Option<&Value>,
        catalog: &CatalogSnapshot,
    ) -> Result<Option<String>> {
        match check_service(raw, catalog) {
            Check::Invalid(service) if policy.on_invalid == OnInvalid::Reject => {
                Err(TranslateError::invalid_service(service, catalog.services()))
            }
            check => self.resolve(policy, check),
        }
    }

    fn filter_tags(
        &self,
        raw: Option<&Value>,
        route: Option<String>,
        route_service: Option<&str>,
        catalog: &CatalogSnapshot,
    ) -> Option<String> {
        let mut pairs = tag_tokens(raw);
        match route {
            Some(route) if route.split_whitespace().count() > 1 => {
                debug!("Dropping operation '{}': not a single tag value", route);
            }
            Some(route) => pairs.push(format!("{}={}", ROUTE_TAG, route.trim())),
            None => {}
        }

        let kept: Vec<String> = pairs
            .into_iter()
            .filter(|pair| {
                let valid = is_valid_tag_pair(pair)
                    && (self.mode != ValidationMode::RouteAware
                        || route_allowed(pair, route_service, catalog));
                if !valid {
                    debug!("Dropping tag '{}'", pair);
                }
                valid
            })
            .collect();

        if kept.is_empty() {
            None
        } else {
            Some(kept.join(" "))
        }
    }
}

/// Conversion from a policy fallback into a field value
trait FromFallback: Sized {
    fn from_fallback(fallback: Fallback) -> Option<Self>;
}

impl FromFallback for u32 {
    fn from_fallback(fallback: Fallback) -> Option<Self> {
        match fallback {
            Fallback::Count(n) => Some(n),
            Fallback::Text(_) => None,
        }
    }
}

impl FromFallback for String {
    fn from_fallback(fallback: Fallback) -> Option<Self> {
        match fallback {
            Fallback::Text(text) => Some(text.to_string()),
            Fallback::Count(n) => Some(n.to_string()),
        }
    }
}

fn check_limit(raw: Option<&Value>) -> Check<u32> {
    let parsed = match raw {
        None => return Check::Absent,
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 1.0).map(|f| f.trunc() as u64)),
        Some(Value::String(s)) => leading_digits(s),
        Some(_) => None,
    };

    match parsed.filter(|n| *n > 0) {
        Some(n) => Check::Valid(u32::try_from(n).unwrap_or(u32::MAX)),
        None => Check::Invalid(raw.map(Value::to_string).unwrap_or_default()),
    }
}

/// `parseInt`-style: digits at the start of the trimmed string
fn leading_digits(s: &str) -> Option<u64> {
    let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    // Overlong digit runs saturate rather than fail
    Some(digits.parse::<u64>().unwrap_or(u64::MAX))
}

fn check_service(raw: Option<&Value>, catalog: &CatalogSnapshot) -> Check<String> {
    match raw {
        None => Check::Absent,
        Some(Value::String(s)) if s.is_empty() => Check::Absent,
        Some(Value::String(s)) if catalog.contains_service(s) => Check::Valid(s.clone()),
        Some(Value::String(s)) => Check::Invalid(s.clone()),
        Some(other) => Check::Invalid(other.to_string()),
    }
}

fn check_pattern(raw: Option<&Value>, pattern: &Regex) -> Check<String> {
    match raw {
        None => Check::Absent,
        Some(Value::String(s)) if pattern.is_match(s) => Check::Valid(s.clone()),
        Some(Value::String(s)) => Check::Invalid(s.clone()),
        Some(other) => Check::Invalid(other.to_string()),
    }
}

fn check_operation(raw: Option<&Value>) -> Check<String> {
    match raw {
        None => Check::Absent,
        Some(Value::String(s)) if s.trim().is_empty() => Check::Absent,
        Some(Value::String(s)) => Check::Valid(s.clone()),
        Some(other) => Check::Invalid(other.to_string()),
    }
}

/// Whitespace-separated tag tokens; objects become `key=value` tokens
fn tag_tokens(raw: Option<&Value>) -> Vec<String> {
    match raw {
        Some(Value::String(s)) => s.split_whitespace().map(str::to_string).collect(),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(key, value)| format!("{}={}", key, scalar_text(value)))
            .flat_map(|pair| {
                pair.split_whitespace()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .flat_map(str::split_whitespace)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_valid_tag_pair(pair: &str) -> bool {
    match pair.split_once('=') {
        Some((key, value)) => {
            !key.is_empty()
                && !value.is_empty()
                && !pair.chars().any(char::is_whitespace)
                && TAG_PAIR_RE.is_match(pair)
        }
        None => false,
    }
}

fn route_allowed(pair: &str, service: Option<&str>, catalog: &CatalogSnapshot) -> bool {
    match pair.split_once('=') {
        Some((key, route)) if key == ROUTE_TAG => service
            .map(|service| catalog.has_route(service, route))
            .unwrap_or(false),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_table_order_and_asymmetry() {
        let fields: Vec<QueryField> = POLICY_TABLE.iter().map(|p| p.field).collect();
        assert_eq!(
            fields,
            vec![
                QueryField::Limit,
                QueryField::Service,
                QueryField::Lookback,
                QueryField::MinDuration,
                QueryField::MaxDuration,
                QueryField::Operation,
                QueryField::Tags,
            ]
        );

        assert_eq!(policy_for(QueryField::Service).on_invalid, OnInvalid::Reject);
        assert_eq!(
            policy_for(QueryField::Lookback).on_invalid,
            OnInvalid::Replace(Fallback::Text("1h"))
        );
        assert_eq!(policy_for(QueryField::MinDuration).on_invalid, OnInvalid::Remove);
        assert!(policy_for(QueryField::Limit).required);
    }

    #[test]
    fn test_tag_pair_shape() {
        assert!(is_valid_tag_pair("error=true"));
        assert!(is_valid_tag_pair("http.status_code=500"));
        assert!(is_valid_tag_pair("k=v=w"));
        assert!(!is_valid_tag_pair("pair="));
        assert!(!is_valid_tag_pair("=novalue"));
        assert!(!is_valid_tag_pair("bad"));
        assert!(!is_valid_tag_pair("sp@ce=1"));
        assert!(!is_valid_tag_pair("http.route=GET /v1/login"));
    }

    #[test]
    fn test_leading_digits() {
        assert_eq!(leading_digits("50"), Some(50));
        assert_eq!(leading_digits(" 25 traces"), Some(25));
        assert_eq!(leading_digits("-5"), None);
        assert_eq!(leading_digits("many"), None);
    }
}
