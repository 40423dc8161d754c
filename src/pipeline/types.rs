//! Request-scoped values and errors for the webhook pipeline.

use crate::{
    extraction::ExtractionError, llm::CompletionError, notes::NotesError, storage::StorageError,
};
use thiserror::Error;

/// Text written to the record when the search matches nothing.
pub const NO_MATCHES_RESULT: &str = "No matching files found.";

/// Caller-supplied query and the record that receives the answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    /// Free-text query used both for the file search and the model prompt.
    pub query: String,
    /// Identifier of the notes-service record to update.
    pub page_id: String,
}

/// Plain text obtained from one matched file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    /// Storage path the text came from.
    pub path: String,
    /// Extracted text, or the unsupported-format sentinel.
    pub text: String,
}

/// Join extracted texts with newlines, preserving extraction order.
pub fn combine_texts(texts: &[ExtractedText]) -> String {
    texts
        .iter()
        .map(|extracted| extracted.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Terminal state of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Search matched nothing; the record received [`NO_MATCHES_RESULT`].
    NoFiles,
    /// The model answered and the record received the answer.
    Answered {
        /// Model answer, verbatim.
        result: String,
        /// Number of matched files fed to the model.
        files: usize,
    },
}

/// Errors emitted by the webhook pipeline. Every stage is attempted exactly once.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// File search or download failed.
    #[error("Storage request failed: {0}")]
    Storage(#[from] StorageError),
    /// A matched document could not be parsed.
    #[error("Text extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    /// The language model did not produce an answer.
    #[error("Completion request failed: {0}")]
    Completion(#[from] CompletionError),
    /// The answer could not be written to the record.
    #[error("Record update failed: {0}")]
    Notes(#[from] NotesError),
}
