//! Client error type

use http::StatusCode;
use thiserror::Error;

/// Result of sending a request through a pipeline
pub type ClientResult<T = crate::ClientResponse> = Result<T, ClientError>;

/// Errors surfaced by the client and its handlers
#[derive(Debug, Error)]
pub enum ClientError {
    /// The transport could not complete the exchange
    #[error("transport error: {0}")]
    Transport(String),

    /// The request did not complete within the client timeout
    #[error("request timed out")]
    Timeout,

    /// The request URL could not be parsed or resolved
    #[error("invalid uri: {0}")]
    InvalidUri(String),

    /// A header name or value was rejected
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// A body could not be serialized or deserialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The server answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Http {
        /// Response status
        status: StatusCode,
        /// Response body, lossily decoded
        body: String,
    },

    /// Client configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Transport(_) | ClientError::Timeout)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_builder() {
            ClientError::InvalidUri(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

impl From<http::Error> for ClientError {
    fn from(err: http::Error) -> Self {
        if err.is::<http::uri::InvalidUri>() {
            ClientError::InvalidUri(err.to_string())
        } else {
            ClientError::InvalidHeader(err.to_string())
        }
    }
}

impl From<http::header::InvalidHeaderValue> for ClientError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        ClientError::InvalidHeader(err.to_string())
    }
}
