//! Batch extraction CLI
//!
//! Reads every `.docx`/`.txt` in the input directory, extracts each one
//! through the OpenAI chat API, and writes the corpus, per-document JSON,
//! CSV views, and a run report to the output directory.
//!
//! Exit codes: 0 on full or partial success, 2 on configuration errors
//! (missing credential, missing input directory), 1 when outputs could not
//! be written.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use sol_extraction::types::{DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use sol_extraction::{
    resolve_api_key, BatchConfig, BatchRunner, CompletionOracle, DelimiterPolicy,
    DirectoryIngestor, ExtractionConfig, ExtractionError, FlattenConfig, OpenAIOracle,
    OutputWriter, RateLimitedOracle, RetryPolicy, RunReport, SecretString, SourceDocument,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "sol-extract")]
#[command(about = "Extract structured standards from SOL documents")]
struct Cli {
    /// Directory containing .docx/.txt documents
    #[arg(long, env = "SOL_INPUT_DIR", default_value = "docs")]
    input_dir: PathBuf,

    /// Directory for JSON and CSV outputs
    #[arg(long, env = "SOL_OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Chat model identifier
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Sampling temperature (0.0 to 2.0)
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    temperature: f32,

    /// API key (falls back to OPENAI_API_KEY)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Custom API base URL (proxies, Azure)
    #[arg(long, env = "OPENAI_BASE_URL")]
    base_url: Option<String>,

    /// Documents extracted concurrently
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Attempts per document for timeouts and rate limits
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 120)]
    timeout_secs: u64,

    /// Cap on requests per minute across the batch
    #[arg(long)]
    requests_per_minute: Option<u32>,

    /// How list items containing ';' are written to CSV
    #[arg(long, value_enum, default_value_t = DelimiterArg::Escape)]
    delimiter_policy: DelimiterArg,

    /// Also write the extracted text of each document as <stem>.txt
    #[arg(long)]
    save_raw_text: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DelimiterArg {
    Escape,
    Reject,
}

impl From<DelimiterArg> for DelimiterPolicy {
    fn from(arg: DelimiterArg) -> Self {
        match arg {
            DelimiterArg::Escape => DelimiterPolicy::Escape,
            DelimiterArg::Reject => DelimiterPolicy::Reject,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sol_extraction=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if is_configuration_error(&e) => {
            eprintln!("Configuration error: {e:#}");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn is_configuration_error(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<ExtractionError>(),
        Some(ExtractionError::Configuration(_))
    )
}

async fn run(cli: Cli) -> Result<()> {
    if !(0.0..=2.0).contains(&cli.temperature) {
        return Err(ExtractionError::Configuration(format!(
            "temperature must be between 0.0 and 2.0, got {}",
            cli.temperature
        ))
        .into());
    }

    // Credential problems surface before any document is read.
    let api_key = resolve_api_key(cli.api_key.as_deref())?;
    let documents = DirectoryIngestor::new(&cli.input_dir).load()?;
    let writer = OutputWriter::create(&cli.output_dir).context("Failed to create output directory")?;

    if documents.is_empty() {
        warn!(dir = %cli.input_dir.display(), "No .docx or .txt documents found");
    }

    if cli.save_raw_text {
        for document in &documents {
            writer
                .write_raw_text(document)
                .with_context(|| format!("Failed to save raw text for {}", document.identifier))?;
        }
    }

    let timeout = Duration::from_secs(cli.timeout_secs);
    let oracle = openai_oracle(&api_key, cli.base_url.as_deref(), timeout);

    match cli.requests_per_minute {
        Some(rpm) => {
            let limited = RateLimitedOracle::per_minute(oracle, rpm)?;
            run_batch(&cli, limited, documents, &writer).await
        }
        None => run_batch(&cli, oracle, documents, &writer).await,
    }
}

fn openai_oracle(api_key: &SecretString, base_url: Option<&str>, timeout: Duration) -> OpenAIOracle {
    let oracle = OpenAIOracle::new(api_key).with_request_timeout(timeout);
    match base_url {
        Some(url) => oracle.with_base_url(url),
        None => oracle,
    }
}

async fn run_batch<O: CompletionOracle>(
    cli: &Cli,
    oracle: O,
    documents: Vec<SourceDocument>,
    writer: &OutputWriter,
) -> Result<()> {
    let extraction = ExtractionConfig::new()
        .with_model(&cli.model)
        .with_temperature(cli.temperature)
        .with_request_timeout(Duration::from_secs(cli.timeout_secs))
        .with_retry(RetryPolicy::default().with_max_attempts(cli.max_attempts));
    let batch = BatchConfig::new().with_concurrency(cli.concurrency);
    let flatten = FlattenConfig::new().with_delimiter_policy(cli.delimiter_policy.into());

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight documents");
            ctrl_c.cancel();
        }
    });

    info!(
        input = %cli.input_dir.display(),
        output = %cli.output_dir.display(),
        documents = documents.len(),
        "Starting extraction"
    );

    let started_at = Utc::now();
    let runner = BatchRunner::new(oracle, extraction, batch);
    let report = runner.run_batch(documents, &cancel).await;
    let run_report = RunReport::new(&report, &cli.model, cli.temperature, started_at);

    writer
        .write_batch(&report, &run_report, &flatten)
        .context("Failed to write outputs")?;

    for line in report.summary_lines() {
        println!("{line}");
    }
    println!("Outputs written to {}", writer.dir().display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["sol-extract", "--api-key", "sk-test"]);
        assert_eq!(cli.model, "gpt-4o-mini");
        assert_eq!(cli.concurrency, 1);
        assert_eq!(cli.max_attempts, 3);
        assert!(matches!(cli.delimiter_policy, DelimiterArg::Escape));
        assert!(!cli.save_raw_text);
    }

    #[test]
    fn test_configuration_errors_are_recognised_through_context() {
        let error = anyhow::Error::from(ExtractionError::Configuration("no key".into()))
            .context("starting run");
        assert!(is_configuration_error(&error));
        assert!(!is_configuration_error(&anyhow::anyhow!("disk full")));
    }

    #[test]
    fn test_delimiter_arg_maps_to_policy() {
        let cli = Cli::parse_from(["sol-extract", "--delimiter-policy", "reject"]);
        assert_eq!(DelimiterPolicy::from(cli.delimiter_policy), DelimiterPolicy::Reject);
    }
}
