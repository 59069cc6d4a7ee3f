//! Batch orchestration: run many documents, isolate failures, keep order.
//!
//! Documents run through a bounded `buffer_unordered` pool. Each outcome
//! carries its input index and the consolidator re-sorts, so completion
//! order never leaks into the corpus. The cancellation token is checked
//! before each document starts; documents never started are not counted.

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::pipeline::consolidate::{consolidate, Consolidated};
use crate::pipeline::extract::Extractor;
use crate::traits::CompletionOracle;
use crate::types::config::{BatchConfig, ExtractionConfig};
use crate::types::corpus::{Corpus, CorpusStats, FailureRecord, IndexedOutcome};
use crate::types::source::SourceDocument;

/// Everything a batch run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub corpus: Corpus,

    /// Failed documents in input order
    pub failures: Vec<FailureRecord>,

    pub stats: CorpusStats,

    /// Documents handed to the extractor
    pub attempted: usize,

    /// Documents never started because of cancellation
    pub skipped: usize,

    /// Tokens spent on documents that did not reach the corpus
    pub failed_tokens_used: u64,

    pub cancelled: bool,
}

impl BatchReport {
    /// Human-readable summary. Lists every failed document with its failure kind.
    pub fn summary_lines(&self) -> Vec<String> {
        let corpus = &self.corpus;
        let mut lines = vec![format!(
            "Processed {} documents: {} successful, {} failed",
            corpus.total_documents, corpus.successful, corpus.failed
        )];

        lines.push(format!(
            "Extracted {} strands, {} standards, {} objectives ({} partial documents)",
            self.stats.strands, self.stats.standards, self.stats.objectives, self.stats.partial_documents
        ));

        if self.failed_tokens_used > 0 {
            lines.push(format!(
                "Tokens used: {} (plus {} on failed documents)",
                corpus.total_tokens_used, self.failed_tokens_used
            ));
        } else {
            lines.push(format!("Tokens used: {}", corpus.total_tokens_used));
        }

        if self.cancelled {
            lines.push(format!(
                "Cancelled: {} documents not attempted",
                self.skipped
            ));
        }

        for failure in &self.failures {
            lines.push(format!(
                "FAILED {}: {} ({})",
                failure.identifier,
                failure.reason.kind(),
                failure.reason
            ));
        }

        lines
    }
}

/// Runs a batch of documents through one extractor.
pub struct BatchRunner<O> {
    extractor: Extractor<O>,
    config: BatchConfig,
}

impl<O: CompletionOracle> BatchRunner<O> {
    pub fn new(oracle: O, extraction: ExtractionConfig, config: BatchConfig) -> Self {
        Self {
            extractor: Extractor::new(oracle, extraction),
            config,
        }
    }

    pub fn from_extractor(extractor: Extractor<O>, config: BatchConfig) -> Self {
        Self { extractor, config }
    }

    pub fn extractor(&self) -> &Extractor<O> {
        &self.extractor
    }

    /// Extract every document and consolidate the results.
    ///
    /// Never fails: per-document problems end up in `failures`.
    pub async fn run_batch(
        &self,
        documents: Vec<SourceDocument>,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let total = documents.len();
        let extractor = &self.extractor;

        info!(
            documents = total,
            concurrency = self.config.concurrency,
            model = %extractor.config().model,
            "Starting batch"
        );

        let outcomes: Vec<IndexedOutcome> = stream::iter(documents.iter().enumerate())
            .map(|(index, document)| async move {
                if cancel.is_cancelled() {
                    return None;
                }
                info!("[{}/{}] Processing {}", index + 1, total, document.identifier);
                let outcome = extractor.extract_one_with_cancel(document, cancel).await;
                Some(IndexedOutcome::new(index, outcome))
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .filter_map(|outcome| async move { outcome })
            .collect()
            .await;

        let attempted = outcomes.len();
        let Consolidated {
            corpus,
            failures,
            failed_tokens_used,
        } = consolidate(outcomes);

        let report = BatchReport {
            stats: corpus.stats(),
            corpus,
            failures,
            attempted,
            skipped: total - attempted,
            failed_tokens_used,
            cancelled: cancel.is_cancelled(),
        };

        info!(
            total = report.corpus.total_documents,
            successful = report.corpus.successful,
            failed = report.corpus.failed,
            skipped = report.skipped,
            tokens = report.corpus.total_tokens_used,
            "Batch complete"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FailureReason, OracleError};
    use crate::pipeline::retry::RetryPolicy;
    use crate::schema::EXAMPLE_OUTPUT;
    use crate::testing::MockOracle;
    use crate::traits::TokenUsage;
    use std::time::Duration;

    fn docs(n: usize) -> Vec<SourceDocument> {
        (1..=n)
            .map(|i| SourceDocument::new(format!("{i}.docx"), format!("text {i}")))
            .collect()
    }

    fn runner(oracle: MockOracle, concurrency: usize) -> BatchRunner<MockOracle> {
        BatchRunner::new(
            oracle,
            ExtractionConfig::default().with_retry(RetryPolicy::none()),
            BatchConfig::new().with_concurrency(concurrency),
        )
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_batch() {
        let oracle = MockOracle::new()
            .with_default_response(EXAMPLE_OUTPUT, TokenUsage::new(10, 5))
            .with_response("2.docx", "not json", TokenUsage::new(3, 1));

        let report = runner(oracle, 1).run_batch(docs(3), &CancellationToken::new()).await;

        assert_eq!(report.corpus.total_documents, 3);
        assert_eq!(report.corpus.successful, 2);
        assert_eq!(report.corpus.failed, 1);
        assert_eq!(report.corpus.total_tokens_used, 30);
        assert_eq!(report.failed_tokens_used, 4);
        assert_eq!(report.failures[0].identifier, "2.docx");
        assert!(!report.cancelled);

        let summary = report.summary_lines().join("\n");
        assert!(summary.contains("FAILED 2.docx: malformed_response"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_completion_keeps_input_order() {
        let oracle = MockOracle::new()
            .with_default_response(EXAMPLE_OUTPUT, TokenUsage::default())
            .with_latency_for("1.docx", Duration::from_secs(3))
            .with_latency_for("2.docx", Duration::from_secs(2))
            .with_latency_for("3.docx", Duration::from_secs(1));

        let report = runner(oracle, 3).run_batch(docs(3), &CancellationToken::new()).await;

        let order: Vec<_> = report
            .corpus
            .documents
            .iter()
            .map(|d| d.extraction_metadata.source_file.as_str())
            .collect();
        assert_eq!(order, vec!["1.docx", "2.docx", "3.docx"]);
    }

    #[tokio::test]
    async fn test_cancel_after_second_document() {
        let cancel = CancellationToken::new();
        let oracle = MockOracle::new()
            .with_default_response(EXAMPLE_OUTPUT, TokenUsage::default())
            .cancel_on_call(2, cancel.clone());

        let report = runner(oracle.clone(), 1).run_batch(docs(5), &cancel).await;

        assert!(report.cancelled);
        assert_eq!(report.corpus.total_documents, 2);
        assert_eq!(report.attempted, 2);
        assert_eq!(report.skipped, 3);
        assert_eq!(oracle.call_count(), 2);
        assert!(report.corpus.is_consistent());
    }

    #[tokio::test]
    async fn test_quota_failure_recorded_per_document() {
        let oracle = MockOracle::new()
            .with_default_response(EXAMPLE_OUTPUT, TokenUsage::default())
            .with_error("1.docx", OracleError::QuotaExceeded);

        let report = runner(oracle, 1).run_batch(docs(2), &CancellationToken::new()).await;

        assert_eq!(report.failures[0].reason, FailureReason::QuotaExceeded);
        assert_eq!(report.corpus.successful, 1);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let report = runner(MockOracle::new(), 2)
            .run_batch(Vec::new(), &CancellationToken::new())
            .await;
        assert_eq!(report.corpus, Corpus::default());
        assert_eq!(report.attempted, 0);
    }
}
