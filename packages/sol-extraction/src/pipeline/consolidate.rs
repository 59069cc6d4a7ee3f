//! Merge per-document outcomes into one corpus.
//!
//! Pure: no I/O, no clock. Outcomes are ordered by their input index first,
//! so any completion order produces the same corpus.

use crate::types::corpus::{Corpus, FailureRecord, IndexedOutcome};

/// Corpus plus the failures that were kept out of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Consolidated {
    pub corpus: Corpus,

    /// Failed documents in input order
    pub failures: Vec<FailureRecord>,

    /// Tokens spent on documents that did not make it into the corpus
    pub failed_tokens_used: u64,
}

/// Fold outcomes into a corpus.
pub fn consolidate(mut outcomes: Vec<IndexedOutcome>) -> Consolidated {
    outcomes.sort_by_key(|o| o.index);

    let mut corpus = Corpus {
        total_documents: outcomes.len(),
        ..Default::default()
    };
    let mut failures = Vec::new();
    let mut failed_tokens_used = 0;

    for IndexedOutcome { outcome, .. } in outcomes {
        let tokens = outcome.tokens_used();
        match outcome.result {
            Ok(document) => {
                corpus.successful += 1;
                corpus.total_tokens_used += tokens;
                corpus.documents.push(document);
            }
            Err(reason) => {
                corpus.failed += 1;
                failed_tokens_used += tokens;
                failures.push(FailureRecord {
                    identifier: outcome.identifier,
                    reason,
                    attempts: outcome.attempts,
                    tokens_used: tokens,
                });
            }
        }
    }

    Consolidated {
        corpus,
        failures,
        failed_tokens_used,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureReason;
    use crate::schema::{DocumentMetadata, ExtractionMetadata, StructuredDocument};
    use crate::traits::TokenUsage;
    use crate::types::corpus::ExtractionOutcome;

    fn success(index: usize, name: &str, tokens: u64) -> IndexedOutcome {
        let document = StructuredDocument {
            document_metadata: DocumentMetadata::new("Grade 1"),
            introduction: None,
            strands: vec![],
            extraction_metadata: ExtractionMetadata {
                source_file: name.into(),
                model: "gpt-4o-mini".into(),
                temperature: 0.1,
                tokens_used: tokens,
                prompt_tokens: tokens,
                completion_tokens: 0,
                prompt_hash: String::new(),
                attempts: 1,
                partial: false,
                warnings: vec![],
            },
        };
        IndexedOutcome::new(
            index,
            ExtractionOutcome {
                identifier: name.into(),
                result: Ok(document),
                usage: Some(TokenUsage::new(tokens, 0)),
                attempts: 1,
            },
        )
    }

    fn failure(index: usize, name: &str, usage: Option<TokenUsage>) -> IndexedOutcome {
        IndexedOutcome::new(
            index,
            ExtractionOutcome {
                identifier: name.into(),
                result: Err(FailureReason::MalformedResponse {
                    detail: "expected value".into(),
                }),
                usage,
                attempts: 1,
            },
        )
    }

    #[test]
    fn test_counters_and_order() {
        let outcomes = vec![
            success(2, "c.docx", 30),
            failure(1, "b.docx", Some(TokenUsage::new(5, 5))),
            success(0, "a.docx", 10),
        ];

        let consolidated = consolidate(outcomes);
        let corpus = &consolidated.corpus;

        assert!(corpus.is_consistent());
        assert_eq!((corpus.total_documents, corpus.successful, corpus.failed), (3, 2, 1));
        assert_eq!(corpus.total_tokens_used, 40);
        assert_eq!(consolidated.failed_tokens_used, 10);

        let order: Vec<_> = corpus
            .documents
            .iter()
            .map(|d| d.extraction_metadata.source_file.as_str())
            .collect();
        assert_eq!(order, vec!["a.docx", "c.docx"]);
        assert_eq!(consolidated.failures[0].identifier, "b.docx");
    }

    #[test]
    fn test_consolidate_is_deterministic() {
        let outcomes = vec![
            success(0, "a.docx", 10),
            failure(1, "b.docx", None),
            success(2, "c.docx", 30),
        ];
        let mut shuffled = outcomes.clone();
        shuffled.reverse();

        let first = serde_json::to_string(&consolidate(outcomes.clone()).corpus).unwrap();
        let second = serde_json::to_string(&consolidate(outcomes).corpus).unwrap();
        let reordered = serde_json::to_string(&consolidate(shuffled).corpus).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, reordered);
    }

    #[test]
    fn test_empty_batch() {
        let consolidated = consolidate(vec![]);
        assert_eq!(consolidated.corpus, Corpus::default());
        assert!(consolidated.failures.is_empty());
    }
}
