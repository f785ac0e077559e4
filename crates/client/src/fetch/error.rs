//! Fetch error types.

use std::sync::Arc;
use std::time::Duration;

/// Errors from the HTTP fetch client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// The URL could not be parsed or has an unsupported scheme.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Non-success HTTP status.
    #[error("status {status}")]
    Status { status: u16, retry_after: Option<Duration> },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response body exceeded the configured limit.
    #[error("{len} bytes exceeds {max}")]
    TooLarge { len: usize, max: usize },
}

impl FetchError {
    /// Whether the server reported the resource as absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::Status { status: 404 | 410, .. })
    }

    /// Server-requested wait before the next attempt, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            FetchError::Status { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { FetchError::Timeout } else { FetchError::Network(Arc::new(err)) }
    }
}

impl From<FetchError> for examdl_core::Error {
    fn from(err: FetchError) -> Self {
        examdl_core::Error::Http(err.to_string())
    }
}
