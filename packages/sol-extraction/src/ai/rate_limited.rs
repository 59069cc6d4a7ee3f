//! Rate-limited oracle wrapper.
//!
//! Wraps any oracle with rate limiting using the governor crate. The permit
//! is taken in [`CompletionOracle::ready`], which the extractor awaits before
//! starting the request timeout. Retries take a fresh permit.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::error::{ExtractionError, OracleError, Result};
use crate::traits::{CompletionOracle, ExtractionRequest, OracleResponse};

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// An oracle wrapper that enforces a request quota.
pub struct RateLimitedOracle<O> {
    inner: O,
    limiter: Arc<DefaultRateLimiter>,
}

impl<O: CompletionOracle> RateLimitedOracle<O> {
    /// Allow at most `requests_per_minute` requests, with no burst.
    pub fn per_minute(inner: O, requests_per_minute: u32) -> Result<Self> {
        let rpm = NonZeroU32::new(requests_per_minute).ok_or_else(|| {
            ExtractionError::Configuration("requests per minute must be > 0".into())
        })?;
        Ok(Self::with_quota(inner, Quota::per_minute(rpm)))
    }

    /// Create with a custom quota.
    pub fn with_quota(inner: O, quota: Quota) -> Self {
        Self {
            inner,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }
}

#[async_trait]
impl<O: CompletionOracle> CompletionOracle for RateLimitedOracle<O> {
    async fn complete(
        &self,
        request: &ExtractionRequest,
    ) -> std::result::Result<OracleResponse, OracleError> {
        self.inner.complete(request).await
    }

    async fn ready(&self) {
        self.limiter.until_ready().await;
        self.inner.ready().await
    }
}
