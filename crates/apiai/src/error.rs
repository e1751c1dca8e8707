//! Client errors

use std::path::PathBuf;

use thiserror::Error;

/// Failure to decode a query response body
///
/// Carries the raw body so malformed upstream payloads can be inspected.
#[derive(Debug, Error)]
#[error("{source} (body: {body})")]
pub struct DecodeError {
    /// Underlying JSON error
    #[source]
    pub source: serde_json::Error,
    /// Raw response body as received
    pub body: String,
}

/// Errors returned by the query and speech synthesis clients
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network level failure (DNS, connect, TLS, timeout, broken body stream)
    #[error("Transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response carried no content where a body is mandatory
    #[error("Empty response from {endpoint} endpoint: content length is 0")]
    EmptyResponse {
        /// Endpoint that produced the empty response
        endpoint: &'static str,
    },

    /// Response body was not a well-formed query response
    #[error("Error parsing response body: {0}")]
    ResponseParse(#[from] DecodeError),

    /// Exchange completed but the service rejected the request
    #[error("HTTP status {status}, body: {body}")]
    RequestRejected {
        /// Transport status line, e.g. `404 Not Found`
        status: String,
        /// Raw response body (empty for the speech endpoint)
        body: String,
    },

    /// Request could not be encoded as JSON
    #[error("Failed to serialize request: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Endpoint URL could not be built from the configured base URL
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    /// File system failure while writing audio
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Audio stream length disagrees with the declared content length
    #[error("Audio length mismatch: declared {declared} bytes, received {received}")]
    LengthMismatch {
        /// Length announced by the server
        declared: u64,
        /// Bytes actually received
        received: u64,
    },

    /// Declared audio length does not fit a RIFF chunk size field
    #[error("Audio too large for a WAV container: {0} bytes")]
    AudioTooLarge(u64),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Language tag not served by the service
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),
}

impl ClientError {
    /// Whether the failure happened below the HTTP application layer
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Whether the service answered but refused the request
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::RequestRejected { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_response_error_message() {
        let err = ClientError::EmptyResponse { endpoint: "query" };
        assert_eq!(
            err.to_string(),
            "Empty response from query endpoint: content length is 0"
        );
    }

    #[test]
    fn request_rejected_error_message() {
        let err = ClientError::RequestRejected {
            status: "401 Unauthorized".to_string(),
            body: "{}".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP status 401 Unauthorized, body: {}");
        assert!(err.is_rejected());
        assert!(!err.is_transport());
    }

    #[test]
    fn decode_error_keeps_body() {
        let source = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err = DecodeError {
            source,
            body: "{oops".to_string(),
        };
        let message = ClientError::from(err).to_string();
        assert!(message.starts_with("Error parsing response body:"));
        assert!(message.ends_with("(body: {oops)"));
    }

    #[test]
    fn length_mismatch_error_message() {
        let err = ClientError::LengthMismatch {
            declared: 100,
            received: 60,
        };
        assert_eq!(
            err.to_string(),
            "Audio length mismatch: declared 100 bytes, received 60"
        );
    }

    #[test]
    fn io_error_names_path() {
        let err = ClientError::io(
            "/tmp/out.wav",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "I/O error on /tmp/out.wav: denied");
    }

    #[test]
    fn unsupported_language_error_message() {
        let err = ClientError::UnsupportedLanguage("xx".to_string());
        assert_eq!(err.to_string(), "Unsupported language: xx");
    }
}
