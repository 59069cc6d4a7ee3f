//! Configuration types for extraction, batching, and flattening.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::pipeline::retry::RetryPolicy;

/// Default chat model (cheap, adequate for structured extraction).
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default sampling temperature. Low for repeatable output.
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Configuration for a single-document extraction.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Model identifier passed to the oracle
    pub model: String,

    /// Determinism parameter (0.0 to 2.0)
    pub temperature: f32,

    /// Upper bound for one oracle request, retries excluded
    pub request_timeout: Duration,

    /// Document text beyond this many bytes is cut at a char boundary.
    ///
    /// Default: 200_000 (well inside a 128k-token context).
    pub max_input_bytes: usize,

    /// Retry policy for retryable transport failures
    pub retry: RetryPolicy,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            request_timeout: Duration::from_secs(120),
            max_input_bytes: 200_000,
            retry: RetryPolicy::default(),
        }
    }
}

impl ExtractionConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the input truncation limit.
    pub fn with_max_input_bytes(mut self, max: usize) -> Self {
        self.max_input_bytes = max;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Concurrent extractions in flight. 1 means strictly sequential.
    pub concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

impl BatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set concurrency (clamped to at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// What to do with a list item that contains the column delimiter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelimiterPolicy {
    /// Backslash-escape `\` and `;` inside items
    #[default]
    Escape,

    /// Fail with `UnrepresentableValue`
    Reject,
}

/// Configuration for flattening.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlattenConfig {
    pub delimiter_policy: DelimiterPolicy,
}

impl FlattenConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter_policy(mut self, policy: DelimiterPolicy) -> Self {
        self.delimiter_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_config_defaults() {
        let config = ExtractionConfig::default();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.temperature, 0.1);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_batch_concurrency_never_zero() {
        assert_eq!(BatchConfig::new().with_concurrency(0).concurrency, 1);
        assert_eq!(BatchConfig::new().with_concurrency(4).concurrency, 4);
    }
}
