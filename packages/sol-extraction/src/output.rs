//! Persist a batch: corpus JSON, per-document JSON, CSV views, run report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{ExtractionError, Result};
use crate::pipeline::batch::BatchReport;
use crate::pipeline::flatten::{flatten, standards_view};
use crate::types::config::FlattenConfig;
use crate::types::corpus::{Corpus, CorpusStats, FailureRecord};
use crate::types::rows::{FlatRow, StandardRow};
use crate::types::source::SourceDocument;

pub const CORPUS_FILE: &str = "all_structured_documents.json";
pub const OBJECTIVES_FILE: &str = "all_objectives.csv";
pub const STANDARDS_FILE: &str = "all_standards.csv";
pub const RUN_REPORT_FILE: &str = "run_report.json";

/// Run-level record written next to the corpus.
///
/// Holds the wall-clock fields that the corpus leaves out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub model: String,
    pub temperature: f32,
    pub prompt_hash: String,
    pub total_documents: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: bool,
    pub total_tokens_used: u64,
    pub failed_tokens_used: u64,
    pub stats: CorpusStats,
    pub failures: Vec<FailureRecord>,
}

impl RunReport {
    pub fn new(
        report: &BatchReport,
        model: impl Into<String>,
        temperature: f32,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            started_at,
            finished_at: Utc::now(),
            model: model.into(),
            temperature,
            prompt_hash: crate::schema::instruction_hash(),
            total_documents: report.corpus.total_documents,
            successful: report.corpus.successful,
            failed: report.corpus.failed,
            skipped: report.skipped,
            cancelled: report.cancelled,
            total_tokens_used: report.corpus.total_tokens_used,
            failed_tokens_used: report.failed_tokens_used,
            stats: report.stats,
            failures: report.failures.clone(),
        }
    }
}

/// Writes output files into one directory.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    /// Create the writer, creating the directory if needed.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| ExtractionError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write every output for a finished batch.
    ///
    /// JSON files go first, so a flatten failure still leaves the corpus on disk.
    pub fn write_batch(
        &self,
        report: &BatchReport,
        run_report: &RunReport,
        flatten_config: &FlattenConfig,
    ) -> Result<()> {
        self.write_corpus(&report.corpus)?;
        self.write_documents(&report.corpus)?;
        self.write_run_report(run_report)?;
        self.write_csv_views(&report.corpus, flatten_config)?;
        info!(dir = %self.dir.display(), "Wrote outputs");
        Ok(())
    }

    pub fn write_corpus(&self, corpus: &Corpus) -> Result<PathBuf> {
        self.write_json(CORPUS_FILE, corpus)
    }

    /// One `<stem>_structured.json` per document in the corpus.
    ///
    /// Sources sharing a stem (`X.docx` and `X.txt`) keep their extension in
    /// the name instead, as `X_docx_structured.json`.
    pub fn write_documents(&self, corpus: &Corpus) -> Result<Vec<PathBuf>> {
        let sources: Vec<SourceDocument> = corpus
            .documents
            .iter()
            .map(|doc| SourceDocument::new(doc.extraction_metadata.source_file.as_str(), ""))
            .collect();

        let mut stems: HashMap<&str, usize> = HashMap::new();
        for source in &sources {
            *stems.entry(source.stem()).or_default() += 1;
        }

        corpus
            .documents
            .iter()
            .zip(&sources)
            .map(|(doc, source)| {
                let name = if stems[source.stem()] > 1 {
                    let name = source.file_name().replace('.', "_");
                    warn!(
                        document = %source.identifier,
                        output = %name,
                        "Another document shares this file stem, keeping the extension"
                    );
                    name
                } else {
                    source.stem().to_string()
                };
                self.write_json(&format!("{name}_structured.json"), doc)
            })
            .collect()
    }

    pub fn write_run_report(&self, report: &RunReport) -> Result<PathBuf> {
        self.write_json(RUN_REPORT_FILE, report)
    }

    /// `all_objectives.csv` and `all_standards.csv`.
    pub fn write_csv_views(&self, corpus: &Corpus, config: &FlattenConfig) -> Result<()> {
        let rows = flatten(corpus, config).map_err(ExtractionError::Flatten)?;
        self.write_csv(OBJECTIVES_FILE, FlatRow::COLUMNS, &rows)?;

        let standards = standards_view(corpus, config).map_err(ExtractionError::Flatten)?;
        self.write_csv(STANDARDS_FILE, StandardRow::COLUMNS, &standards)?;
        Ok(())
    }

    /// Dump the extracted input text as `<stem>.txt`.
    pub fn write_raw_text(&self, document: &SourceDocument) -> Result<PathBuf> {
        let path = self.dir.join(format!("{}.txt", document.stem()));
        fs::write(&path, &document.text).map_err(|e| ExtractionError::io(&path, e))?;
        Ok(path)
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let path = self.dir.join(name);
        let file = File::create(&path).map_err(|e| ExtractionError::io(&path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush().map_err(|e| ExtractionError::io(&path, e))?;
        Ok(path)
    }

    /// Header is written from `columns` so an empty view still has one.
    fn write_csv<T: Serialize>(&self, name: &str, columns: &[&str], rows: &[T]) -> Result<PathBuf> {
        let path = self.dir.join(name);
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)?;
        writer.write_record(columns)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush().map_err(|e| ExtractionError::io(&path, e))?;
        Ok(path)
    }
}
