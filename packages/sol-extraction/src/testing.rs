//! Testing utilities including a scripted mock oracle.
//!
//! Useful for exercising the pipeline without making real model calls.
//! Timestamps come from `tokio::time`, so tests running on a paused clock
//! can assert on backoff gaps exactly.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::OracleError;
use crate::traits::{CompletionOracle, ExtractionRequest, OracleResponse, TokenUsage};

type Scripted = Result<OracleResponse, OracleError>;

/// A mock oracle for testing.
///
/// Replies come from a per-identifier queue first, then from the default.
/// Clones share state, so keep one clone for assertions after handing the
/// other to an extractor.
#[derive(Clone, Default)]
pub struct MockOracle {
    /// Scripted replies by document identifier, consumed in order
    scripts: Arc<RwLock<HashMap<String, VecDeque<Scripted>>>>,

    /// Reply once a document's queue is empty
    default: Arc<RwLock<Option<Scripted>>>,

    /// Simulated latency for every call
    latency: Duration,

    /// Per-identifier latency overrides
    latency_by_id: Arc<RwLock<HashMap<String, Duration>>>,

    /// Cancel this token when the Nth call (1-based) arrives
    cancel_on_call: Option<(usize, CancellationToken)>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockOracleCall>>>,
}

/// Record of a call made to the mock oracle.
#[derive(Debug, Clone)]
pub struct MockOracleCall {
    pub identifier: String,
    pub model: String,
    pub input_len: usize,
    pub at: Instant,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply for a document.
    pub fn with_response(
        self,
        identifier: impl Into<String>,
        text: impl Into<String>,
        usage: TokenUsage,
    ) -> Self {
        self.push(identifier.into(), Ok(OracleResponse::new(text, usage)));
        self
    }

    /// Queue a failed reply for a document.
    pub fn with_error(self, identifier: impl Into<String>, error: OracleError) -> Self {
        self.push(identifier.into(), Err(error));
        self
    }

    /// Reply used when no scripted reply is queued.
    pub fn with_default_response(self, text: impl Into<String>, usage: TokenUsage) -> Self {
        *self.default.write().unwrap() = Some(Ok(OracleResponse::new(text, usage)));
        self
    }

    /// Error used when no scripted reply is queued.
    pub fn with_default_error(self, error: OracleError) -> Self {
        *self.default.write().unwrap() = Some(Err(error));
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Latency for one document, overriding the global latency.
    pub fn with_latency_for(self, identifier: impl Into<String>, latency: Duration) -> Self {
        self.latency_by_id
            .write()
            .unwrap()
            .insert(identifier.into(), latency);
        self
    }

    /// Cancel `token` when call number `n` (1-based) arrives.
    pub fn cancel_on_call(mut self, n: usize, token: CancellationToken) -> Self {
        self.cancel_on_call = Some((n, token));
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockOracleCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// Identifiers in call order.
    pub fn called_identifiers(&self) -> Vec<String> {
        self.calls
            .read()
            .unwrap()
            .iter()
            .map(|c| c.identifier.clone())
            .collect()
    }

    /// Time between consecutive calls.
    pub fn call_gaps(&self) -> Vec<Duration> {
        let calls = self.calls.read().unwrap();
        calls
            .windows(2)
            .map(|pair| pair[1].at.duration_since(pair[0].at))
            .collect()
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }

    fn push(&self, identifier: String, reply: Scripted) {
        self.scripts
            .write()
            .unwrap()
            .entry(identifier)
            .or_default()
            .push_back(reply);
    }

    fn next_reply(&self, identifier: &str) -> Scripted {
        let scripted = self
            .scripts
            .write()
            .unwrap()
            .get_mut(identifier)
            .and_then(VecDeque::pop_front);

        scripted
            .or_else(|| self.default.read().unwrap().clone())
            .unwrap_or_else(|| {
                Err(OracleError::Transport(format!(
                    "no scripted reply for {identifier}"
                )))
            })
    }
}

#[async_trait]
impl CompletionOracle for MockOracle {
    async fn complete(&self, request: &ExtractionRequest) -> Result<OracleResponse, OracleError> {
        let call_number = {
            let mut calls = self.calls.write().unwrap();
            calls.push(MockOracleCall {
                identifier: request.identifier.clone(),
                model: request.model.clone(),
                input_len: request.input.len(),
                at: Instant::now(),
            });
            calls.len()
        };

        if let Some((n, token)) = &self.cancel_on_call {
            if call_number == *n {
                token.cancel();
            }
        }

        let latency = self
            .latency_by_id
            .read()
            .unwrap()
            .get(&request.identifier)
            .copied()
            .unwrap_or(self.latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        self.next_reply(&request.identifier)
    }
}
