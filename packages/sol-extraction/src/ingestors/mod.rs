//! Source document loading.
//!
//! - [`DirectoryIngestor`] reads every `.docx` and `.txt` in a directory
//! - [`parse_filename_hints`] guesses grade/course/year from a file name
//! - [`extract_docx_text`] turns a Word container into plain text

mod directory;
mod docx;
mod filename;

pub use directory::DirectoryIngestor;
pub use docx::{document_xml_to_text, extract_docx_text};
pub use filename::parse_filename_hints;
