use thiserror::Error;

use crate::config::ConfigError;

/// Error bodies are kept whole; only the `Display` text is truncated.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {}", truncate_body(.0))]
    AccessDenied(String),

    /// Backend answered 401. The token slot has already been cleared and
    /// the navigator sent to the login route by the time this is returned.
    #[error("Unauthorized - session expired")]
    Unauthorized(String),

    #[error("Resource not found: {}", truncate_body(.0))]
    NotFound(String),

    #[error("Rate limited: {}", truncate_body(.0))]
    RateLimited(String),

    #[error("Server error: {}", truncate_body(.0))]
    ServerError(String),

    #[error("Unexpected status {}: {}", .status, truncate_body(.body))]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Truncate a response body to avoid logging excessive data
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}

impl ApiError {
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let body = body.to_string();
        match status.as_u16() {
            401 => ApiError::Unauthorized(body),
            403 => ApiError::AccessDenied(body),
            404 => ApiError::NotFound(body),
            429 => ApiError::RateLimited(body),
            500..=599 => ApiError::ServerError(body),
            _ => ApiError::UnexpectedStatus { status, body },
        }
    }

    /// Full response body carried by a status error, if any.
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized(body)
            | ApiError::AccessDenied(body)
            | ApiError::NotFound(body)
            | ApiError::RateLimited(body)
            | ApiError::ServerError(body)
            | ApiError::UnexpectedStatus { body, .. } => Some(body),
            _ => None,
        }
    }

    /// The `detail` field of a JSON error body.
    ///
    /// A string detail is returned as-is; any other non-null JSON value
    /// (validation error lists, objects) is rendered back to JSON text.
    pub fn detail(&self) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(self.body()?).ok()?;
        match value.get("detail")? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}
