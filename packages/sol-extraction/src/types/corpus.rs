//! Run-level result types: per-document outcomes, failures, and the corpus.

use serde::{Deserialize, Serialize};

use crate::error::FailureReason;
use crate::schema::StructuredDocument;
use crate::traits::TokenUsage;

/// Result of extracting a single document.
///
/// `result` is either a document or a reason, never both. `usage` is kept
/// whenever the oracle answered, even if the answer failed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionOutcome {
    pub identifier: String,
    pub result: Result<StructuredDocument, FailureReason>,
    pub usage: Option<TokenUsage>,

    /// Oracle requests issued, including retries
    pub attempts: u32,
}

impl ExtractionOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn tokens_used(&self) -> u64 {
        self.usage.map(|u| u.total_tokens).unwrap_or(0)
    }
}

/// An outcome tagged with its position in the batch input.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedOutcome {
    pub index: usize,
    pub outcome: ExtractionOutcome,
}

impl IndexedOutcome {
    pub fn new(index: usize, outcome: ExtractionOutcome) -> Self {
        Self { index, outcome }
    }
}

/// A document that did not make it into the corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub identifier: String,
    pub reason: FailureReason,
    pub attempts: u32,
    pub tokens_used: u64,
}

/// Consolidated collection of every successfully extracted document.
///
/// Invariants: `total_documents == successful + failed` and
/// `documents.len() == successful`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    pub total_documents: usize,
    pub successful: usize,
    pub failed: usize,

    /// Tokens spent on documents in `documents`
    pub total_tokens_used: u64,

    /// Successful documents in input order
    pub documents: Vec<StructuredDocument>,
}

impl Corpus {
    /// Whether the counter invariants hold.
    pub fn is_consistent(&self) -> bool {
        self.total_documents == self.successful + self.failed
            && self.documents.len() == self.successful
    }

    /// Structural counts across all documents.
    pub fn stats(&self) -> CorpusStats {
        let mut stats = CorpusStats {
            documents: self.documents.len(),
            ..Default::default()
        };
        for doc in &self.documents {
            stats.strands += doc.strands.len();
            stats.standards += doc.standard_count();
            stats.objectives += doc.objective_count();
            if doc.extraction_metadata.partial {
                stats.partial_documents += 1;
            }
        }
        stats
    }
}

/// Size of the extracted corpus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub documents: usize,
    pub strands: usize,
    pub standards: usize,
    pub objectives: usize,

    /// Documents kept with some standards dropped or repaired
    pub partial_documents: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DocumentMetadata, ExtractionMetadata, Objective, Standard, Strand};

    fn document(partial: bool) -> StructuredDocument {
        StructuredDocument {
            document_metadata: DocumentMetadata::new("Grade 2"),
            introduction: None,
            strands: vec![Strand::new("NS", "Number and Number Sense").with_standard(
                Standard::new("2.NS.1", "Count.")
                    .with_objective(Objective::new("Count by twos.", "count"))
                    .with_objective(Objective::new("Count by fives.", "count")),
            )],
            extraction_metadata: ExtractionMetadata {
                source_file: "2.docx".into(),
                model: "gpt-4o-mini".into(),
                temperature: 0.1,
                tokens_used: 10,
                prompt_tokens: 8,
                completion_tokens: 2,
                prompt_hash: String::new(),
                attempts: 1,
                partial,
                warnings: vec![],
            },
        }
    }

    #[test]
    fn test_stats_count_every_level() {
        let corpus = Corpus {
            total_documents: 3,
            successful: 2,
            failed: 1,
            total_tokens_used: 20,
            documents: vec![document(false), document(true)],
        };

        assert!(corpus.is_consistent());
        assert_eq!(
            corpus.stats(),
            CorpusStats {
                documents: 2,
                strands: 2,
                standards: 2,
                objectives: 4,
                partial_documents: 1,
            }
        );
    }

    #[test]
    fn test_corpus_serializes_compatibility_fields() {
        let json = serde_json::to_value(Corpus::default()).unwrap();
        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["documents", "failed", "successful", "total_documents", "total_tokens_used"]
        );
    }
}
