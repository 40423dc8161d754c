//! Plain-text extraction for the document formats found in the storage service.
//!
//! Dispatch is purely by file extension through an [`ExtractorRegistry`]. Each extractor takes
//! the complete file contents and returns one string. Paths whose extension has no registered
//! extractor resolve to [`UNSUPPORTED_FORMAT`] and are never downloaded.

pub mod docx;
pub mod pdf;
pub mod pptx;
pub mod xlsx;

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Text returned in place of content for files without a registered extractor.
pub const UNSUPPORTED_FORMAT: &str = "Unsupported file format.";

/// Extraction function: complete file bytes in, plain text out.
pub type Extractor = fn(&[u8]) -> Result<String, ExtractionError>;

/// Errors produced while turning a document into plain text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The document could not be parsed as the format its extension claims.
    #[error("Failed to parse {format} document: {message}")]
    Parse {
        /// Extension of the format being parsed.
        format: &'static str,
        /// Parser diagnostic.
        message: String,
    },
    /// The blocking extraction task panicked or was cancelled.
    #[error("Extraction worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl ExtractionError {
    pub(crate) fn parse(format: &'static str, error: impl fmt::Display) -> Self {
        Self::Parse {
            format,
            message: error.to_string(),
        }
    }
}

/// Mapping from lowercase file extension to extraction function.
#[derive(Clone)]
pub struct ExtractorRegistry {
    extractors: HashMap<String, Extractor>,
}

impl ExtractorRegistry {
    /// Registry without any formats.
    pub fn empty() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Register (or replace) the extractor for `extension`. A leading dot is ignored and
    /// matching is case-insensitive.
    pub fn register(&mut self, extension: &str, extractor: Extractor) -> &mut Self {
        let key = extension.trim_start_matches('.').to_ascii_lowercase();
        self.extractors.insert(key, extractor);
        self
    }

    /// Builder-style variant of [`ExtractorRegistry::register`].
    pub fn with(mut self, extension: &str, extractor: Extractor) -> Self {
        self.register(extension, extractor);
        self
    }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> Vec<&str> {
        let mut extensions: Vec<&str> = self.extractors.keys().map(String::as_str).collect();
        extensions.sort_unstable();
        extensions
    }

    /// Extractor responsible for `path`, if its extension is registered.
    pub fn resolve(&self, path: &str) -> Option<Extractor> {
        extension_of(path).and_then(|extension| self.extractors.get(&extension).copied())
    }

    /// Extract text from in-memory contents, returning the sentinel for unsupported paths.
    pub fn extract_bytes(&self, path: &str, data: &[u8]) -> Result<String, ExtractionError> {
        match self.resolve(path) {
            Some(extractor) => extractor(data),
            None => Ok(UNSUPPORTED_FORMAT.to_string()),
        }
    }
}

impl Default for ExtractorRegistry {
    /// Registry with the PDF, DOCX, XLSX and PPTX extractors installed.
    fn default() -> Self {
        Self::empty()
            .with("pdf", pdf::extract)
            .with("docx", docx::extract)
            .with("xlsx", xlsx::extract)
            .with("pptx", pptx::extract)
    }
}

/// Run an extractor on the blocking thread pool.
pub async fn extract_blocking(extractor: Extractor, data: Vec<u8>) -> Result<String, ExtractionError> {
    let text = tokio::task::spawn_blocking(move || extractor(&data)).await??;
    Ok(text)
}

/// Lowercase extension of the final path component, without the dot.
fn extension_of(path: &str) -> Option<String> {
    let file_name = path.rsplit('/').next()?;
    let (_, extension) = file_name.rsplit_once('.')?;
    if extension.is_empty() {
        None
    } else {
        Some(extension.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shout(data: &[u8]) -> Result<String, ExtractionError> {
        Ok(String::from_utf8_lossy(data).to_uppercase())
    }

    #[test]
    fn default_registry_covers_office_formats() {
        let registry = ExtractorRegistry::default();
        assert_eq!(registry.extensions(), vec!["docx", "pdf", "pptx", "xlsx"]);
    }

    #[test]
    fn resolution_is_case_insensitive() {
        let registry = ExtractorRegistry::default();
        assert!(registry.resolve("/Reports/Q3.PDF").is_some());
        assert!(registry.resolve("/Reports/deck.Pptx").is_some());
    }

    #[test]
    fn unsupported_extension_yields_sentinel() {
        let registry = ExtractorRegistry::default();
        assert!(registry.resolve("/notes/todo.txt").is_none());
        let text = registry
            .extract_bytes("/notes/todo.txt", b"plain text")
            .expect("no fault");
        assert_eq!(text, "Unsupported file format.");
    }

    #[test]
    fn paths_without_extension_are_unsupported() {
        let registry = ExtractorRegistry::default();
        assert!(registry.resolve("/Budget").is_none());
        assert!(registry.resolve("/archive.d/README").is_none());
        assert!(registry.resolve("/trailing.").is_none());
    }

    #[test]
    fn registering_a_format_needs_no_dispatch_changes() {
        let registry = ExtractorRegistry::empty().with(".TXT", shout);
        let text = registry
            .extract_bytes("/notes/todo.txt", b"buy milk")
            .expect("custom extractor");
        assert_eq!(text, "BUY MILK");
    }

    #[test]
    fn corrupt_documents_surface_parse_errors() {
        let registry = ExtractorRegistry::default();
        for path in ["a.pdf", "a.docx", "a.xlsx", "a.pptx"] {
            let error = registry
                .extract_bytes(path, b"definitely not a document")
                .expect_err("corrupt input");
            assert!(matches!(error, ExtractionError::Parse { .. }), "{path}: {error}");
        }
    }

    #[tokio::test]
    async fn blocking_extraction_returns_extractor_output() {
        let text = extract_blocking(shout, b"hello".to_vec())
            .await
            .expect("extraction");
        assert_eq!(text, "HELLO");
    }
}
