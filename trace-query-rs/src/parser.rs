//! Recovery of the candidate query object from generated text
//!
//! Two tiers, each usable on its own: the whole text as JSON, then the span
//! from the first `{` to the last `}`. The second tier only runs when the
//! text is not JSON at all.

use serde_json::{Map, Value};

use crate::error::{Result, TranslateError};
use crate::util::truncate_string;

/// Loosely-typed query object as produced by the model
pub type Candidate = Map<String, Value>;

/// Parse the entire text as one JSON object.
///
/// `Ok(None)` means the text is not JSON at all. JSON of any other shape
/// than an object is an error, not a reason to look further.
pub fn parse_whole(text: &str) -> Result<Option<Candidate>> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(other) => Err(not_an_object(&other)),
        Err(_) => Ok(None),
    }
}

/// Largest JSON-looking substring: first `{` through last `}`
pub fn extract_brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;

    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

/// Recover a JSON object from raw generated text, tolerating surrounding prose
pub fn extract(text: &str) -> Result<Candidate> {
    if let Some(candidate) = parse_whole(text)? {
        return Ok(candidate);
    }

    let span = extract_brace_span(text).ok_or_else(|| {
        TranslateError::malformed_response(format!(
            "no JSON object found in model output: {}",
            truncate_string(text.trim(), 200)
        ))
    })?;

    match serde_json::from_str::<Value>(span)? {
        Value::Object(map) => Ok(map),
        other => Err(not_an_object(&other)),
    }
}

fn not_an_object(value: &Value) -> TranslateError {
    TranslateError::malformed_response(format!(
        "expected a JSON object, got {}",
        truncate_string(&value.to_string(), 200)
    ))
}
