use serde::{Deserialize, Serialize};
use crate::models::domain::NeighborhoodMatch;

/// One line of the match event stream
///
/// Serialized with a `status` tag, e.g. `{"status":"match","data":{..},"index":0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProgressEvent {
    Processing { message: String },
    Match { data: NeighborhoodMatch, index: usize },
    Complete { total: usize },
    Error { message: String },
}

impl ProgressEvent {
    pub fn processing(message: impl Into<String>) -> Self {
        ProgressEvent::Processing { message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ProgressEvent::Error { message: message.into() }
    }

    /// True for `complete` and `error`
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Complete { .. } | ProgressEvent::Error { .. })
    }

    /// Serialize as a single newline-terminated JSON line
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Service banner returned from the API root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
