//! Error types for provider operations.

use thiserror::Error;

/// Errors that can occur while talking to a chat provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider is misconfigured (missing key, malformed URL).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The provider rejected the request due to rate limiting.
    #[error("rate limited by provider")]
    RateLimited,

    /// The provider returned an error status.
    #[error("provider error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The provider responded, but the body could not be interpreted.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Whether a retry with backoff can reasonably succeed.
    ///
    /// Rate limits, transport failures and upstream 5xx responses are
    /// transient; everything else indicates a bad request or setup.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::RateLimited | ProviderError::Network(_) => true,
            ProviderError::Api { status, .. } => *status >= 500,
            ProviderError::Configuration(_) | ProviderError::InvalidResponse(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::RateLimited.is_retryable());
        assert!(ProviderError::Network("connection reset".into()).is_retryable());
        assert!(ProviderError::Api {
            status: 503,
            message: "overloaded".into()
        }
        .is_retryable());

        assert!(!ProviderError::Api {
            status: 400,
            message: "bad request".into()
        }
        .is_retryable());
        assert!(!ProviderError::Configuration("no key".into()).is_retryable());
        assert!(!ProviderError::InvalidResponse("empty choices".into()).is_retryable());
    }
}
