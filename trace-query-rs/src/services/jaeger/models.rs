//! Trace-metadata API data models

use serde::{Deserialize, Serialize};

/// Envelope every metadata route answers with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    /// Payload; some backends send `null` for an empty result
    pub data: Option<Vec<T>>,
}

impl<T> DataResponse<T> {
    pub fn into_data(self) -> Vec<T> {
        self.data.unwrap_or_default()
    }
}

/// One entry of an operations listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum OperationEntry {
    /// Legacy listing: bare operation names
    Name(String),

    /// Listing with span kinds
    Detailed {
        name: String,
        #[serde(rename = "spanKind", default, skip_serializing_if = "Option::is_none")]
        span_kind: Option<String>,
    },
}

impl OperationEntry {
    pub fn into_name(self) -> String {
        match self {
            OperationEntry::Name(name) => name,
            OperationEntry::Detailed { name, .. } => name,
        }
    }
}
