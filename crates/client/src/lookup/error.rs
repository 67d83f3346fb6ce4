//! Lookup client error types.

use std::sync::Arc;

/// Transport-level failures talking to the lookup service.
///
/// HTTP error statuses are not errors here; they are returned in
/// [`LookupResponse`](super::LookupResponse) for the caller to branch on.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LookupError {
    /// Configured lookup URL could not be parsed.
    #[error("invalid lookup URL: {0}")]
    InvalidUrl(String),

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error (DNS, connect, TLS, body read).
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { LookupError::Timeout } else { LookupError::Network(Arc::new(err)) }
    }
}

impl From<LookupError> for sbguard_core::Error {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::InvalidUrl(msg) => sbguard_core::Error::InvalidUrl(msg),
            other => sbguard_core::Error::LookupFailed(other.to_string()),
        }
    }
}
