//! Core trait abstractions.

pub mod oracle;

pub use oracle::{CompletionOracle, ExtractionRequest, OracleResponse, TokenUsage};
