//! Oracle trait for the external text-completion model.
//!
//! The pipeline treats the model as an opaque request/response service:
//! instruction + document text in, response text + token usage out.
//! Implementations wrap a specific provider (OpenAI, a proxy, a mock) and
//! classify their own transport failures into [`OracleError`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

use crate::error::OracleError;

/// One model request. Built fresh for every call.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Identifier of the source document (for logging and mocks)
    pub identifier: String,

    /// Model identifier
    pub model: String,

    /// System instruction describing the target schema
    pub instruction: String,

    /// Determinism parameter
    pub temperature: f32,

    /// User message: metadata hint followed by the document text
    pub input: String,
}

/// Input and output token counts for one response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, other: Self) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// Raw oracle reply.
#[derive(Debug, Clone)]
pub struct OracleResponse {
    pub text: String,
    pub usage: TokenUsage,
}

impl OracleResponse {
    pub fn new(text: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            text: text.into(),
            usage,
        }
    }
}

/// External text-completion service.
#[async_trait]
pub trait CompletionOracle: Send + Sync {
    /// Send one request and return the model's text.
    ///
    /// Must not retry internally; retry policy belongs to the caller.
    async fn complete(&self, request: &ExtractionRequest) -> Result<OracleResponse, OracleError>;

    /// Wait until a request may be sent.
    ///
    /// Awaited before each attempt, outside the per-request timeout, so
    /// client-side throttling never counts against the request.
    async fn ready(&self) {}
}

#[async_trait]
impl<T: CompletionOracle + ?Sized> CompletionOracle for std::sync::Arc<T> {
    async fn complete(&self, request: &ExtractionRequest) -> Result<OracleResponse, OracleError> {
        (**self).complete(request).await
    }

    async fn ready(&self) {
        (**self).ready().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_accumulates() {
        let mut total = TokenUsage::default();
        total += TokenUsage::new(100, 20);
        total += TokenUsage::new(50, 5);
        assert_eq!(total, TokenUsage { prompt_tokens: 150, completion_tokens: 25, total_tokens: 175 });
    }
}
