//! Plain text from `.docx` containers.
//!
//! Reads `word/document.xml` and keeps only what the model needs: one line
//! per paragraph, headings marked `### text ###`, and tables after the body
//! text as `[TABLE]` blocks with cells joined by ` | `.

use regex::Regex;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;
use zip::ZipArchive;

use crate::error::{ExtractionError, Result};

static RE_TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<w:tbl>.*?</w:tbl>").expect("valid regex"));
static RE_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<w:tr[ >].*?</w:tr>").expect("valid regex"));
static RE_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<w:tc[ >].*?</w:tc>").expect("valid regex"));
static RE_PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<w:p[ >].*?</w:p>").expect("valid regex"));
static RE_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<w:pStyle w:val="([^"]*)"\s*/>"#).expect("valid regex"));
static RE_RUN_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>|<w:tab/>|<w:br/>").expect("valid regex")
});

/// Extract text from a `.docx` file.
pub fn extract_docx_text(path: &Path) -> Result<String> {
    let docx_error = |reason: String| ExtractionError::Docx {
        path: path.display().to_string(),
        reason,
    };

    let file = File::open(path).map_err(|e| ExtractionError::io(path, e))?;
    let mut archive = ZipArchive::new(file).map_err(|e| docx_error(e.to_string()))?;
    let mut entry = archive
        .by_name("word/document.xml")
        .map_err(|e| docx_error(e.to_string()))?;

    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| docx_error(e.to_string()))?;

    Ok(document_xml_to_text(&xml))
}

/// Convert WordprocessingML body XML to plain text.
pub fn document_xml_to_text(xml: &str) -> String {
    let mut parts = Vec::new();

    let body = RE_TABLE.replace_all(xml, "");
    for paragraph in RE_PARAGRAPH.find_iter(&body) {
        let text = paragraph_text(paragraph.as_str());
        if text.is_empty() {
            continue;
        }
        if is_heading(paragraph.as_str()) {
            parts.push(format!("\n### {text} ###\n"));
        } else {
            parts.push(text);
        }
    }

    for table in RE_TABLE.find_iter(xml) {
        parts.push("\n[TABLE]".to_string());
        for row in RE_ROW.find_iter(table.as_str()) {
            let cells: Vec<String> = RE_CELL
                .find_iter(row.as_str())
                .map(|cell| cell_text(cell.as_str()))
                .collect();
            let line = cells.join(" | ");
            if !line.trim().trim_matches('|').trim().is_empty() {
                parts.push(line);
            }
        }
        parts.push("[/TABLE]\n".to_string());
    }

    parts.join("\n")
}

fn is_heading(paragraph: &str) -> bool {
    RE_STYLE
        .captures(paragraph)
        .map(|caps| caps[1].contains("Head") || caps[1].contains("Title"))
        .unwrap_or(false)
}

fn paragraph_text(paragraph: &str) -> String {
    let mut text = String::new();
    for caps in RE_RUN_TEXT.captures_iter(paragraph) {
        match caps.get(1) {
            Some(run) => text.push_str(&decode_entities(run.as_str())),
            None if caps[0].starts_with("<w:tab") => text.push('\t'),
            None => text.push('\n'),
        }
    }
    text.trim().to_string()
}

fn cell_text(cell: &str) -> String {
    RE_PARAGRAPH
        .find_iter(cell)
        .map(|p| paragraph_text(p.as_str()))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<w:document><w:body>
<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Number and Number Sense</w:t></w:r></w:p>
<w:p w:rsidR="00A1"><w:r><w:t xml:space="preserve">1.NS.1 The student will </w:t></w:r><w:r><w:t>count &amp; compare.</w:t></w:r></w:p>
<w:p/>
<w:tbl><w:tr><w:tc><w:p><w:r><w:t>Standard</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>Objective</w:t></w:r></w:p></w:tc></w:tr>
<w:tr><w:tc><w:p><w:r><w:t>1.NS.1</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>Count to 120</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
<w:p><w:r><w:t>After the table.</w:t></w:r></w:p>
</w:body></w:document>"#;

    #[test]
    fn test_paragraphs_headings_and_tables() {
        let text = document_xml_to_text(XML);
        let expected = [
            "\n### Number and Number Sense ###\n",
            "1.NS.1 The student will count & compare.",
            "After the table.",
            "\n[TABLE]",
            "Standard | Objective",
            "1.NS.1 | Count to 120",
            "[/TABLE]\n",
        ]
        .join("\n");
        assert_eq!(text, expected);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = extract_docx_text(Path::new("/nonexistent/file.docx")).unwrap_err();
        assert!(matches!(err, ExtractionError::Io { .. }));
    }
}
