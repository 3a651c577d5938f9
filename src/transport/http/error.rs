//! Error types raised by the HTTP transport.

use thiserror::Error;

use crate::transport::TransportError;

/// Convenient result alias returning [`HttpTransportError`] failures.
pub type HttpResult<T> = Result<T, HttpTransportError>;

/// Failures that can occur while talking to the game service over HTTP.
#[derive(Debug, Error)]
pub enum HttpTransportError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build game service client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The configured base URL cannot carry API paths.
    #[error("invalid game service URL `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    /// A request could not be sent or timed out.
    #[error("failed to send request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The response body could not be read.
    #[error("failed to read response from `{path}`")]
    ReadBody {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The response body did not match the expected payload.
    #[error("failed to decode response from `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<HttpTransportError> for TransportError {
    fn from(err: HttpTransportError) -> Self {
        TransportError::unavailable(err.to_string(), err)
    }
}
