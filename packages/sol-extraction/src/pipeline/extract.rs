//! Single-document extraction: request, retry, validate.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::FailureReason;
use crate::pipeline::retry::RequestState;
use crate::pipeline::validate::{parse_response, ParsedResponse, Validated};
use crate::schema::{extraction_instruction, instruction_hash, ExtractionMetadata, StructuredDocument};
use crate::traits::{CompletionOracle, ExtractionRequest, OracleResponse};
use crate::types::config::ExtractionConfig;
use crate::types::corpus::ExtractionOutcome;
use crate::types::source::SourceDocument;

impl ExtractionRequest {
    /// Build the request for one document.
    ///
    /// The user message carries the file-name hint (if any) ahead of the
    /// document text. Text longer than `max_input_bytes` is cut at a char
    /// boundary.
    pub fn build(document: &SourceDocument, config: &ExtractionConfig) -> Self {
        let text = truncate_to_char_boundary(&document.text, config.max_input_bytes);
        if text.len() < document.text.len() {
            warn!(
                document = %document.identifier,
                original_len = document.text.len(),
                truncated_len = text.len(),
                "Document text truncated"
            );
        }

        let mut input = String::with_capacity(text.len() + 128);
        if let Some(hint) = document.hints.describe() {
            input.push_str(&format!("Document metadata hint (from file name): {hint}\n\n"));
        }
        input.push_str("Extract structured data from this SOL document:\n\n");
        input.push_str(text);

        Self {
            identifier: document.identifier.clone(),
            model: config.model.clone(),
            instruction: extraction_instruction(),
            temperature: config.temperature,
            input,
        }
    }
}

fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Runs one document through the oracle and the validator.
pub struct Extractor<O> {
    oracle: O,
    config: ExtractionConfig,
    prompt_hash: String,
}

impl<O: CompletionOracle> Extractor<O> {
    pub fn new(oracle: O, config: ExtractionConfig) -> Self {
        Self {
            oracle,
            config,
            prompt_hash: instruction_hash(),
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Extract one document. Never fails: every problem is an `Err` in the outcome.
    pub async fn extract_one(&self, document: &SourceDocument) -> ExtractionOutcome {
        self.extract_one_with_cancel(document, &CancellationToken::new())
            .await
    }

    /// Like [`extract_one`](Self::extract_one), but a cancelled token stops
    /// any pending retry. The request in flight is allowed to finish.
    pub async fn extract_one_with_cancel(
        &self,
        document: &SourceDocument,
        cancel: &CancellationToken,
    ) -> ExtractionOutcome {
        let request = ExtractionRequest::build(document, &self.config);
        let retry = &self.config.retry;
        let mut attempts = 0u32;
        let mut state = RequestState::Pending;

        let response = loop {
            state = match state {
                RequestState::Succeeded(response) => break response,
                RequestState::Failed(reason) => {
                    return failure(document, reason, None, attempts);
                }
                RequestState::Pending => self.attempt(&request, &mut attempts).await,
                RequestState::Retrying { attempt, last } => {
                    let delay = retry.delay_for(attempt, rand::random::<f64>());
                    warn!(
                        document = %document.identifier,
                        attempt,
                        max_attempts = retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        reason = last.kind(),
                        "Retrying extraction"
                    );

                    let cancelled = tokio::select! {
                        _ = cancel.cancelled() => true,
                        _ = tokio::time::sleep(delay) => false,
                    };
                    if cancelled {
                        info!(document = %document.identifier, "Cancelled during backoff");
                        RequestState::Failed(last)
                    } else {
                        self.attempt(&request, &mut attempts).await
                    }
                }
            };
        };

        self.finish(document, response, attempts)
    }

    async fn attempt(
        &self,
        request: &ExtractionRequest,
        attempts: &mut u32,
    ) -> RequestState<OracleResponse> {
        self.oracle.ready().await;

        *attempts += 1;
        debug!(document = %request.identifier, attempt = *attempts, "Sending extraction request");

        let result = tokio::time::timeout(self.config.request_timeout, self.oracle.complete(request)).await;
        match result {
            Ok(Ok(response)) => RequestState::Succeeded(response),
            Ok(Err(e)) => self.config.retry.on_failure(*attempts, e.into()),
            Err(_) => self.config.retry.on_failure(*attempts, FailureReason::Timeout),
        }
    }

    fn finish(
        &self,
        document: &SourceDocument,
        response: OracleResponse,
        attempts: u32,
    ) -> ExtractionOutcome {
        let usage = response.usage;

        let validated = match parse_response(&response.text, &document.hints) {
            ParsedResponse::Valid(validated) => validated,
            ParsedResponse::Malformed(detail) => {
                return failure(
                    document,
                    FailureReason::MalformedResponse { detail },
                    Some(usage),
                    attempts,
                );
            }
            ParsedResponse::Invalid(issues) => {
                let issues = issues.iter().map(ToString::to_string).collect();
                return failure(
                    document,
                    FailureReason::SchemaViolation { issues },
                    Some(usage),
                    attempts,
                );
            }
        };

        let partial = validated.is_partial();
        let Validated {
            metadata,
            introduction,
            strands,
            issues,
        } = validated;

        if partial {
            warn!(
                document = %document.identifier,
                issues = issues.len(),
                "Kept partial extraction"
            );
        } else if !issues.is_empty() {
            debug!(document = %document.identifier, repairs = issues.len(), "Repaired response");
        }

        let structured = StructuredDocument {
            document_metadata: metadata,
            introduction,
            strands,
            extraction_metadata: ExtractionMetadata {
                source_file: document.identifier.clone(),
                model: self.config.model.clone(),
                temperature: self.config.temperature,
                tokens_used: usage.total_tokens,
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                prompt_hash: self.prompt_hash.clone(),
                attempts,
                partial,
                warnings: issues.iter().map(ToString::to_string).collect(),
            },
        };

        info!(
            document = %document.identifier,
            standards = structured.standard_count(),
            objectives = structured.objective_count(),
            tokens = usage.total_tokens,
            "Extracted document"
        );

        ExtractionOutcome {
            identifier: document.identifier.clone(),
            result: Ok(structured),
            usage: Some(usage),
            attempts,
        }
    }
}

fn failure(
    document: &SourceDocument,
    reason: FailureReason,
    usage: Option<crate::traits::TokenUsage>,
    attempts: u32,
) -> ExtractionOutcome {
    warn!(
        document = %document.identifier,
        reason = reason.kind(),
        attempts,
        error = %reason,
        "Extraction failed"
    );
    ExtractionOutcome {
        identifier: document.identifier.clone(),
        result: Err(reason),
        usage,
        attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OracleError;
    use crate::pipeline::retry::RetryPolicy;
    use crate::schema::EXAMPLE_OUTPUT;
    use crate::testing::MockOracle;
    use crate::traits::TokenUsage;
    use crate::types::source::DocumentHints;
    use std::time::Duration;

    fn config() -> ExtractionConfig {
        ExtractionConfig::default().with_retry(
            RetryPolicy::default()
                .with_base_delay(Duration::from_secs(1))
                .with_jitter(false),
        )
    }

    fn doc() -> SourceDocument {
        SourceDocument::new("1-Grade 1-2023-Approved-Math-SOL.docx", "1.NS.1 The student will ...")
    }

    #[test]
    fn test_request_carries_hint_and_truncates() {
        let document = SourceDocument::new("a.docx", "ééééé").with_hints(DocumentHints {
            grade_level: Some("Grade 1".into()),
            ..Default::default()
        });
        let request = ExtractionRequest::build(&document, &ExtractionConfig::default().with_max_input_bytes(5));

        assert!(request.input.contains("grade_level=Grade 1"));
        assert!(request.input.ends_with("éé"));
        assert_eq!(request.model, "gpt-4o-mini");
        assert!(request.instruction.contains("JSON only"));
    }

    #[tokio::test]
    async fn test_success_records_usage_and_metadata() {
        let oracle = MockOracle::new().with_default_response(EXAMPLE_OUTPUT, TokenUsage::new(900, 300));
        let extractor = Extractor::new(oracle, config());

        let outcome = extractor.extract_one(&doc()).await;
        let structured = outcome.result.unwrap();

        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.usage, Some(TokenUsage::new(900, 300)));
        assert_eq!(structured.extraction_metadata.tokens_used, 1200);
        assert_eq!(structured.extraction_metadata.prompt_hash, instruction_hash());
        assert!(!structured.extraction_metadata.partial);
    }

    #[tokio::test]
    async fn test_repairs_are_warnings_without_partial() {
        let reply = r#"{
            "document_metadata": {"title": "Mathematics"},
            "strands": [{
                "strand_code": "NS",
                "strand_name": "Number and Number Sense",
                "standards": [{
                    "standard_id": "1.NS.1",
                    "standard_statement": "The student will count.",
                    "knowledge_and_skills": ["Count forward by ones to 120."],
                    "tags": "counting"
                }]
            }]
        }"#;
        let oracle = MockOracle::new().with_default_response(reply, TokenUsage::new(10, 5));
        let extractor = Extractor::new(oracle, config());

        let document = doc().with_hints(DocumentHints {
            grade_level: Some("Grade 1".into()),
            ..Default::default()
        });
        let structured = extractor.extract_one(&document).await.result.unwrap();

        assert_eq!(structured.document_metadata.grade_level, "Grade 1");
        assert_eq!(structured.extraction_metadata.warnings.len(), 3);
        assert!(!structured.extraction_metadata.partial);
    }

    #[tokio::test]
    async fn test_malformed_keeps_usage() {
        let oracle = MockOracle::new().with_default_response("Sure! Here is the data:", TokenUsage::new(50, 7));
        let extractor = Extractor::new(oracle, config());

        let outcome = extractor.extract_one(&doc()).await;

        assert!(matches!(outcome.result, Err(FailureReason::MalformedResponse { .. })));
        assert_eq!(outcome.usage, Some(TokenUsage::new(50, 7)));
        assert_eq!(outcome.attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_gives_up_after_three_attempts() {
        let oracle = MockOracle::new().with_default_error(OracleError::RateLimited);
        let extractor = Extractor::new(oracle.clone(), config());

        let outcome = extractor.extract_one(&doc()).await;

        assert_eq!(outcome.result, Err(FailureReason::RateLimited));
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.usage, None);

        let gaps = oracle.call_gaps();
        assert_eq!(gaps, vec![Duration::from_secs(1), Duration::from_secs(2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_then_success() {
        let oracle = MockOracle::new()
            .with_error("1-Grade 1-2023-Approved-Math-SOL.docx", OracleError::Timeout)
            .with_response("1-Grade 1-2023-Approved-Math-SOL.docx", EXAMPLE_OUTPUT, TokenUsage::new(10, 10));
        let extractor = Extractor::new(oracle.clone(), config());

        let outcome = extractor.extract_one(&doc()).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.attempts, 2);
        assert_eq!(oracle.call_count(), 2);
    }

    #[tokio::test]
    async fn test_auth_error_not_retried() {
        let oracle = MockOracle::new().with_default_error(OracleError::AuthRejected("bad key".into()));
        let extractor = Extractor::new(oracle.clone(), config());

        let outcome = extractor.extract_one(&doc()).await;

        assert!(matches!(outcome.result, Err(FailureReason::AuthError { .. })));
        assert_eq!(oracle.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_oracle_times_out() {
        let oracle = MockOracle::new()
            .with_default_response(EXAMPLE_OUTPUT, TokenUsage::default())
            .with_latency(Duration::from_secs(10));
        let extractor = Extractor::new(
            oracle.clone(),
            config()
                .with_request_timeout(Duration::from_secs(2))
                .with_retry(RetryPolicy::none()),
        );

        let outcome = extractor.extract_one(&doc()).await;
        assert_eq!(outcome.result, Err(FailureReason::Timeout));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff_stops_retries() {
        let oracle = MockOracle::new().with_default_error(OracleError::RateLimited);
        let extractor = Extractor::new(oracle.clone(), config());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = extractor.extract_one_with_cancel(&doc(), &cancel).await;

        assert_eq!(outcome.result, Err(FailureReason::RateLimited));
        assert_eq!(outcome.attempts, 1);
        assert_eq!(oracle.call_count(), 1);
    }
}
