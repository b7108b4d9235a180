//! Error types for hnsync-gateway.

use thiserror::Error;

/// All errors that can arise from remote gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No bearer token available.
    #[error("no API token found; set ${var} or run `hnsync init --save-token`")]
    MissingToken { var: String },

    /// The request's outer timeout expired.
    #[error("remote call timed out: {source}")]
    Timeout {
        #[source]
        source: reqwest::Error,
    },

    /// Transport-level failure (connection, TLS, malformed response body).
    #[error("remote transport error: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a GraphQL error.
    #[error("remote error: {message}")]
    Api { message: String },

    /// The service answered without errors but also without the expected data.
    #[error("remote returned no data for {operation}")]
    MissingData { operation: &'static str },
}

impl From<reqwest::Error> for GatewayError {
    fn from(source: reqwest::Error) -> Self {
        if source.is_timeout() {
            GatewayError::Timeout { source }
        } else {
            GatewayError::Transport { source }
        }
    }
}
