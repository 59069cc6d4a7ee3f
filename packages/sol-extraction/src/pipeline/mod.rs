//! Extraction pipeline.
//!
//! Flow per batch:
//! - [`batch`] schedules documents and isolates failures
//! - [`extract`] sends one request, with [`retry`] around transport failures
//! - [`validate`] turns response text into a document, repairing what it can
//! - [`consolidate`] folds outcomes into a corpus in input order
//! - [`flatten`] projects the corpus into rows

pub mod batch;
pub mod consolidate;
pub mod extract;
pub mod flatten;
pub mod retry;
pub mod validate;

pub use batch::{BatchReport, BatchRunner};
pub use consolidate::{consolidate, Consolidated};
pub use extract::Extractor;
pub use flatten::{flatten, split_list, standards_view, LIST_DELIMITER};
pub use retry::{RequestState, RetryPolicy};
pub use validate::{parse_response, validate_response, ParsedResponse, Validated, ValidationIssue};
