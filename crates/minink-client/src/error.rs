/*
[INPUT]:  Error sources (HTTP, status codes, serialization, URL building, WebSocket)
[OUTPUT]: Structured client error type with retry hints
[POS]:    Error handling layer - unified error type for the client crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for minink agent access
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Agent answered with a non-success status
    #[error("agent returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Host string cannot be turned into an endpoint
    #[error("Invalid host '{0}'")]
    InvalidHost(String),

    /// WebSocket handshake or transport error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Check if the error is transient. The viewer never retries on its own,
    /// a supervising layer may.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(_) | ClientError::WebSocket(_) => true,
            ClientError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Check if the error comes from a bad host or URL rather than the network
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::UrlParse(_) | ClientError::InvalidHost(_) | ClientError::Config(_)
        )
    }

    /// Create a status error from a response code and body
    pub fn status_error(status: StatusCode, body: impl Into<String>) -> Self {
        ClientError::Status {
            status: status.as_u16(),
            body: body.into(),
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ClientError::WebSocket(err.to_string())
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        let server_err = ClientError::status_error(StatusCode::BAD_GATEWAY, "upstream");
        assert!(server_err.is_retryable());

        let client_err = ClientError::status_error(StatusCode::BAD_REQUEST, "bad filter");
        assert!(!client_err.is_retryable());

        assert!(ClientError::WebSocket("reset".to_string()).is_retryable());
        assert!(!ClientError::InvalidHost("".to_string()).is_retryable());
    }

    #[test]
    fn test_error_is_config_error() {
        assert!(ClientError::InvalidHost("ftp://x".to_string()).is_config_error());
        assert!(ClientError::Config("no hosts".to_string()).is_config_error());
        assert!(!ClientError::WebSocket("closed".to_string()).is_config_error());
    }

    #[test]
    fn test_status_error_creation() {
        let err = ClientError::status_error(StatusCode::NOT_FOUND, "no such route");
        match err {
            ClientError::Status { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "no such route");
            }
            _ => panic!("Expected Status error variant"),
        }
    }
}
