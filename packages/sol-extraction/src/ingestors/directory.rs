//! Load every supported document in a directory.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::docx::extract_docx_text;
use super::filename::parse_filename_hints;
use crate::error::{ExtractionError, Result};
use crate::types::source::SourceDocument;

/// Reads `.docx` and `.txt` files (non-recursive), sorted by file name.
#[derive(Debug, Clone)]
pub struct DirectoryIngestor {
    dir: PathBuf,
}

impl DirectoryIngestor {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load all documents.
    ///
    /// A missing directory is a configuration error. Files that cannot be
    /// read are logged and skipped; empty text is passed through.
    pub fn load(&self) -> Result<Vec<SourceDocument>> {
        if !self.dir.is_dir() {
            return Err(ExtractionError::Configuration(format!(
                "input directory not found: {}",
                self.dir.display()
            )));
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(|e| ExtractionError::io(&self.dir, e))? {
            let entry = entry.map_err(|e| ExtractionError::io(&self.dir, e))?;
            let path = entry.path();
            if path.is_file() && is_supported(&path) {
                paths.push(path);
            }
        }
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            match read_document(&path) {
                Ok(document) => {
                    debug!(
                        document = %document.identifier,
                        chars = document.text.len(),
                        "Loaded document"
                    );
                    documents.push(document);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable document"),
            }
        }

        info!(dir = %self.dir.display(), documents = documents.len(), "Loaded input directory");
        Ok(documents)
    }
}

fn is_supported(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    // Word lock files ("~$name.docx") and hidden files
    if name.starts_with("~$") || name.starts_with('.') {
        return false;
    }
    matches!(
        path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref(),
        Some("docx") | Some("txt")
    )
}

fn read_document(path: &Path) -> Result<SourceDocument> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| ExtractionError::Docx {
            path: path.display().to_string(),
            reason: "file name is not valid UTF-8".into(),
        })?;

    let is_docx = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("docx"));

    let text = if is_docx {
        extract_docx_text(path)?
    } else {
        std::fs::read_to_string(path).map_err(|e| ExtractionError::io(path, e))?
    };

    let hints = parse_filename_hints(&name);
    Ok(SourceDocument::new(name, text).with_hints(hints))
}
