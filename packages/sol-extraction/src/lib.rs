//! Curriculum Standards Extraction Library
//!
//! Turns Standards of Learning documents into a validated, hierarchical
//! corpus (document > strand > standard > objective) by sending each
//! document to a text-completion model under a fixed schema contract.
//!
//! # Pipeline
//!
//! - Every document gets one request with the extraction instruction and a
//!   metadata hint parsed from its file name
//! - Responses are parsed and validated; broken standards are dropped and
//!   the rest kept, with the document flagged `partial`
//! - Failures are recorded per document and never abort the batch
//! - Outcomes are consolidated in input order and flattened to CSV rows
//!
//! # Usage
//!
//! ```rust,ignore
//! use sol_extraction::{BatchConfig, BatchRunner, DirectoryIngestor, ExtractionConfig};
//! use sol_extraction::testing::MockOracle;
//! use tokio_util::sync::CancellationToken;
//!
//! let documents = DirectoryIngestor::new("docs").load()?;
//! let runner = BatchRunner::new(MockOracle::new(), ExtractionConfig::default(), BatchConfig::default());
//! let report = runner.run_batch(documents, &CancellationToken::new()).await;
//!
//! for line in report.summary_lines() {
//!     println!("{line}");
//! }
//! ```
//!
//! # Modules
//!
//! - [`schema`] - Document shape, closed enumerations, extraction instruction
//! - [`traits`] - The completion oracle abstraction
//! - [`pipeline`] - Extract, validate, retry, batch, consolidate, flatten
//! - [`ai`] - Oracle implementations (rate limiting, OpenAI)
//! - [`ingestors`] - Loading `.docx`/`.txt` inputs and file-name hints
//! - [`output`] - JSON and CSV writers
//! - [`security`] - Credential handling
//! - [`testing`] - Mock oracle for tests

pub mod ai;
pub mod error;
pub mod ingestors;
pub mod output;
pub mod pipeline;
pub mod schema;
pub mod security;
pub mod testing;
pub mod traits;
pub mod types;

pub use error::{ExtractionError, FailureReason, OracleError, Result};
pub use traits::{CompletionOracle, ExtractionRequest, OracleResponse, TokenUsage};

pub use schema::{
    CognitiveLevel, DocumentMetadata, ExtractionMetadata, Objective, QuestionType, Standard,
    Strand, StructuredDocument,
};

pub use types::{
    BatchConfig, Corpus, CorpusStats, DelimiterPolicy, DocumentHints, ExtractionConfig,
    ExtractionOutcome, FailureRecord, FlatRow, FlattenConfig, IndexedOutcome, SourceDocument,
    StandardRow,
};

pub use pipeline::{
    consolidate, flatten, standards_view, BatchReport, BatchRunner, Consolidated, Extractor,
    ParsedResponse, RequestState, RetryPolicy,
};

pub use ai::RateLimitedOracle;

#[cfg(feature = "openai")]
pub use ai::OpenAIOracle;

pub use ingestors::{parse_filename_hints, DirectoryIngestor};
pub use output::{OutputWriter, RunReport};
pub use security::{resolve_api_key, SecretString};

// Re-export testing utilities
pub use testing::MockOracle;
