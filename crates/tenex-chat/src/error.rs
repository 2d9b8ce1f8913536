//! Error types for the chat client

use thiserror::Error;

/// Longest error body kept from a failed response.
const MAX_ERROR_BODY: usize = 512;

/// Chat client error types
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("HTTP error! status: {status}")]
    Status { status: u16, body: String },

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid session cookie: {0}")]
    InvalidSession(String),

    #[error("Not authenticated")]
    Unauthorized,

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChatError {
    /// Build a status error, truncating the body to keep large or sensitive
    /// responses out of logs.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        let mut body = body.into();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
            body.push_str("... [truncated]");
        }
        ChatError::Status { status, body }
    }

    /// HTTP status carried by the error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ChatError::Status { status, .. } => Some(*status),
            ChatError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for chat operations
pub type Result<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_names_the_code() {
        let err = ChatError::status(503, "unavailable");
        assert_eq!(err.to_string(), "HTTP error! status: 503");
        assert_eq!(err.status_code(), Some(503));
    }

    #[test]
    fn long_bodies_are_truncated() {
        let err = ChatError::status(500, "x".repeat(2048));
        let ChatError::Status { body, .. } = err else {
            panic!("expected status error");
        };
        assert!(body.ends_with("... [truncated]"));
        assert_eq!(body.len(), MAX_ERROR_BODY + "... [truncated]".len());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let err = ChatError::status(500, "é".repeat(600));
        let ChatError::Status { body, .. } = err else {
            panic!("expected status error");
        };
        assert!(body.ends_with("... [truncated]"));
    }
}
