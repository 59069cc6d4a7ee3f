//! Oracle implementations.
//!
//! [`RateLimitedOracle`] wraps any oracle with a request quota. The OpenAI
//! adapter is behind the `openai` feature.

mod rate_limited;

#[cfg(feature = "openai")]
mod openai;

pub use rate_limited::RateLimitedOracle;

#[cfg(feature = "openai")]
pub use openai::OpenAIOracle;
