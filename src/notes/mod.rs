//! Notion integration: writes answers back into page properties.

pub mod client;
pub mod payload;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

pub use client::NotionClient;
pub use payload::{AnswerRecord, local_timestamp};

/// Errors returned while updating records in the notes service.
#[derive(Debug, Error)]
pub enum NotesError {
    /// HTTP client could not be constructed or the request failed before a response arrived.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Notes service responded with an unexpected status code.
    #[error("Unexpected Notion response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by Notion.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Record-update operation the pipeline depends on.
#[async_trait]
pub trait NotesClient: Send + Sync {
    /// Overwrite the result and timestamp fields of record `page_id`.
    async fn update_record(&self, page_id: &str, record: &AnswerRecord) -> Result<(), NotesError>;
}
