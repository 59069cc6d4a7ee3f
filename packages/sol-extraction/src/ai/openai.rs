//! OpenAI implementation of the oracle trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use sol_extraction::ai::OpenAIOracle;
//!
//! let oracle = OpenAIOracle::new(&api_key).with_request_timeout(Duration::from_secs(120));
//! let runner = BatchRunner::new(oracle, ExtractionConfig::default(), BatchConfig::default());
//! ```

use async_trait::async_trait;
use openai_client::{ChatRequest, Message, OpenAIClient, OpenAIError};
use std::time::Duration;

use crate::error::OracleError;
use crate::security::SecretString;
use crate::traits::{CompletionOracle, ExtractionRequest, OracleResponse, TokenUsage};

/// Chat-completions oracle using JSON-object response mode.
#[derive(Clone)]
pub struct OpenAIOracle {
    client: OpenAIClient,
}

impl OpenAIOracle {
    pub fn new(api_key: &SecretString) -> Self {
        Self {
            client: OpenAIClient::new(api_key.expose()),
        }
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.client = self.client.with_base_url(url);
        self
    }

    /// HTTP-level timeout. The extractor applies its own timeout on top.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }
}

#[async_trait]
impl CompletionOracle for OpenAIOracle {
    async fn complete(&self, request: &ExtractionRequest) -> Result<OracleResponse, OracleError> {
        let chat = ChatRequest::new(&request.model)
            .message(Message::system(&request.instruction))
            .message(Message::user(&request.input))
            .temperature(request.temperature)
            .json_object();

        let response = self.client.chat_completion(chat).await.map_err(classify)?;

        let usage = response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens.into(), u.completion_tokens.into()))
            .unwrap_or_default();

        Ok(OracleResponse::new(response.content, usage))
    }
}

fn classify(error: OpenAIError) -> OracleError {
    match error {
        OpenAIError::Timeout(_) => OracleError::Timeout,
        OpenAIError::RateLimited(_) => OracleError::RateLimited,
        OpenAIError::Auth(detail) => OracleError::AuthRejected(detail),
        OpenAIError::QuotaExceeded(_) => OracleError::QuotaExceeded,
        other => OracleError::Transport(other.to_string()),
    }
}
