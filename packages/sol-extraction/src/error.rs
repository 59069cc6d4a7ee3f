//! Typed errors for the extraction library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! Three layers:
//! - [`ExtractionError`] is fatal to a run (bad configuration, unwritable output).
//! - [`FailureReason`] is recorded per document and never aborts a batch.
//! - [`OracleError`] is what a [`CompletionOracle`](crate::CompletionOracle)
//!   reports for a single request, before retry policy is applied.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Missing or invalid credential, missing input directory, bad settings.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Filesystem operation failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The document container could not be read
    #[error("unreadable document {path}: {reason}")]
    Docx { path: String, reason: String },

    /// Flattening could not represent a value
    #[error("flatten failed: {0}")]
    Flatten(FailureReason),
}

impl ExtractionError {
    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

/// Why a single document did not make it into the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// Response text is not parseable JSON
    #[error("malformed response: {detail}")]
    MalformedResponse { detail: String },

    /// Response parsed but no usable standard survived validation
    #[error("schema violation: {}", issues.join("; "))]
    SchemaViolation { issues: Vec<String> },

    #[error("request timed out")]
    Timeout,

    #[error("rate limited")]
    RateLimited,

    #[error("authentication rejected: {detail}")]
    AuthError { detail: String },

    #[error("quota exceeded")]
    QuotaExceeded,

    #[error("transport failure: {detail}")]
    Transport { detail: String },

    /// A list item cannot be expressed in a delimiter-joined column
    #[error("unrepresentable value in {field}: {value:?}")]
    UnrepresentableValue { field: String, value: String },
}

impl FailureReason {
    /// Short stable label, used in summaries and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedResponse { .. } => "malformed_response",
            Self::SchemaViolation { .. } => "schema_violation",
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::AuthError { .. } => "auth_error",
            Self::QuotaExceeded => "quota_exceeded",
            Self::Transport { .. } => "transport",
            Self::UnrepresentableValue { .. } => "unrepresentable_value",
        }
    }

    /// Whether the retry policy may resubmit the request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::RateLimited)
    }
}

/// Transport-level failure of one oracle request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("timeout")]
    Timeout,

    #[error("rate limited")]
    RateLimited,

    #[error("authentication rejected: {0}")]
    AuthRejected(String),

    #[error("quota exceeded")]
    QuotaExceeded,

    #[error("transport: {0}")]
    Transport(String),
}

impl From<OracleError> for FailureReason {
    fn from(error: OracleError) -> Self {
        match error {
            OracleError::Timeout => FailureReason::Timeout,
            OracleError::RateLimited => FailureReason::RateLimited,
            OracleError::AuthRejected(detail) => FailureReason::AuthError { detail },
            OracleError::QuotaExceeded => FailureReason::QuotaExceeded,
            OracleError::Transport(detail) => FailureReason::Transport { detail },
        }
    }
}

/// Result type alias for fatal operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;
