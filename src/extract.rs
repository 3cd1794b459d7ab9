//! Extension-dispatched text extraction for ingestible files.
//!
//! PDFs go through `pdf-extract` (page text concatenated); `.txt` and
//! `.md` are read verbatim as UTF-8. Anything else is reported as
//! unsupported so the pipeline can skip it without raising.

use std::path::Path;
use tracing::warn;

use crate::error::PipelineError;

/// File extensions the ingestion pipeline accepts.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt", "md"];

/// Outcome of extracting a file.
#[derive(Debug)]
pub enum Extracted {
    /// The extension is not an ingestible type.
    Unsupported,
    /// Extracted text. May be empty, e.g. a scanned-image PDF.
    Text(String),
}

/// Whether the path's extension is one the pipeline ingests.
pub fn is_supported(path: &Path) -> bool {
    file_extension(path)
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Extract the text content of `path` according to its extension.
///
/// Read errors propagate; a PDF that parses but yields no text (or fails to
/// parse at all) comes back as empty text, which the caller treats as a
/// soft no-op.
pub fn extract_path(path: &Path) -> Result<Extracted, PipelineError> {
    match file_extension(path).as_deref() {
        Some("pdf") => Ok(Extracted::Text(read_pdf(path)?)),
        Some("txt") | Some("md") => Ok(Extracted::Text(std::fs::read_to_string(path)?)),
        _ => Ok(Extracted::Unsupported),
    }
}

fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn read_pdf(path: &Path) -> Result<String, PipelineError> {
    let bytes = std::fs::read(path)?;
    match pdf_extract::extract_text_from_mem(&bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "PDF text extraction failed, treating as empty");
            Ok(String::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_extensions_are_recognized() {
        assert!(is_supported(Path::new("notes.md")));
        assert!(is_supported(Path::new("report.PDF")));
        assert!(is_supported(Path::new("dir/readme.txt")));
        assert!(!is_supported(Path::new("image.png")));
        assert!(!is_supported(Path::new("no_extension")));
    }

    #[test]
    fn unsupported_extension_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "a,b,c").unwrap();

        let result = extract_path(&path).unwrap();
        assert!(matches!(result, Extracted::Unsupported));
    }

    #[test]
    fn plain_text_is_read_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "line one\nline two\n").unwrap();

        match extract_path(&path).unwrap() {
            Extracted::Text(text) => assert_eq!(text, "line one\nline two\n"),
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn missing_file_propagates_the_error() {
        let result = extract_path(Path::new("/nonexistent/notes.txt"));
        assert!(result.is_err());
    }

    #[test]
    fn garbled_pdf_degrades_to_empty_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();

        match extract_path(&path).unwrap() {
            Extracted::Text(text) => assert!(text.is_empty()),
            other => panic!("expected empty text, got {:?}", other),
        }
    }
}
