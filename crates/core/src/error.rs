//! Error types for the GenWeb domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Request-shape and configuration errors live with the crates that
//! raise them; this module holds the provider failures every crate sees.

use thiserror::Error;

/// Failures raised by a text-generation provider, either when the
/// request is made or while the response is streaming.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn stream_interrupted_displays_reason() {
        let err = ProviderError::StreamInterrupted("connection reset".into());
        assert_eq!(err.to_string(), "Stream interrupted: connection reset");
    }
}
