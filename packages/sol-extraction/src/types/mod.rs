//! Value types shared across the pipeline.

pub mod config;
pub mod corpus;
pub mod rows;
pub mod source;

pub use config::{
    BatchConfig, DelimiterPolicy, ExtractionConfig, FlattenConfig, DEFAULT_MODEL,
    DEFAULT_TEMPERATURE,
};
pub use corpus::{Corpus, CorpusStats, ExtractionOutcome, FailureRecord, IndexedOutcome};
pub use rows::{FlatRow, StandardRow};
pub use source::{DocumentHints, SourceDocument};
