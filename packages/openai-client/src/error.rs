//! Error types for OpenAI client.

use thiserror::Error;

/// Result type for OpenAI client operations.
pub type Result<T> = std::result::Result<T, OpenAIError>;

/// OpenAI client errors.
///
/// Transport and HTTP failures are classified up front so callers can decide
/// what is worth retrying without parsing error strings.
#[derive(Debug, Error)]
pub enum OpenAIError {
    /// Request did not complete within the client timeout (or 408/504)
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// 429 without a quota marker
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// 401/403 - key missing, revoked, or lacking access to the model
    #[error("Authentication rejected: {0}")]
    Auth(String),

    /// 429 with `insufficient_quota`, or 402
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Network error (connection refused, DNS, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// Any other non-2xx response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl OpenAIError {
    /// Classify a non-success HTTP response.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = body.trim().to_string();
        match status {
            401 | 403 => Self::Auth(message),
            402 => Self::QuotaExceeded(message),
            429 if body.contains("insufficient_quota") => Self::QuotaExceeded(message),
            429 => Self::RateLimited(message),
            408 | 504 => Self::Timeout(message),
            _ => Self::Api { status, message },
        }
    }

    /// Classify a reqwest transport error.
    pub fn from_transport(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(OpenAIError::from_status(401, ""), OpenAIError::Auth(_)));
        assert!(matches!(OpenAIError::from_status(403, ""), OpenAIError::Auth(_)));
        assert!(matches!(
            OpenAIError::from_status(429, r#"{"error":{"type":"rate_limit_exceeded"}}"#),
            OpenAIError::RateLimited(_)
        ));
        assert!(matches!(
            OpenAIError::from_status(429, r#"{"error":{"code":"insufficient_quota"}}"#),
            OpenAIError::QuotaExceeded(_)
        ));
        assert!(matches!(OpenAIError::from_status(504, ""), OpenAIError::Timeout(_)));
        assert!(matches!(
            OpenAIError::from_status(500, "boom"),
            OpenAIError::Api { status: 500, .. }
        ));
    }
}
