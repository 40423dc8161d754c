//! Shared types used by the Dropbox client.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors returned while interacting with the storage service.
#[derive(Debug, Error)]
pub enum StorageError {
    /// HTTP client could not be constructed or the request failed before a response arrived.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Request argument could not be serialized.
    #[error("Invalid request argument: {0}")]
    InvalidArgument(#[from] serde_json::Error),
    /// Storage service responded with an unexpected status code.
    #[error("Unexpected Dropbox response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by Dropbox.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Kind of entry referenced by a search match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Folder; never parseable, dispatched like any other path.
    Folder,
    /// Deleted or otherwise unrecognized entry.
    Other,
}

/// A single search hit pointing at an entry in the storage service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMatch {
    /// Display path of the entry, used for download and extension dispatch.
    pub path: String,
    /// Final path component as reported by the service.
    pub name: String,
    /// Entry kind.
    pub kind: EntryKind,
}

impl FileMatch {
    /// Convenience constructor for a regular file.
    pub fn file(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or_default().to_string();
        Self {
            path,
            name,
            kind: EntryKind::File,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchV2Response {
    #[serde(default)]
    pub(crate) matches: Vec<SearchMatchV2>,
    #[serde(default)]
    pub(crate) has_more: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchMatchV2 {
    pub(crate) metadata: MetadataV2,
}

#[derive(Debug, Deserialize)]
#[serde(tag = ".tag", rename_all = "snake_case")]
pub(crate) enum MetadataV2 {
    Metadata { metadata: EntryMetadata },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EntryMetadata {
    #[serde(rename = ".tag")]
    pub(crate) tag: String,
    #[serde(default)]
    pub(crate) name: String,
    pub(crate) path_display: Option<String>,
    pub(crate) path_lower: Option<String>,
}

impl EntryMetadata {
    /// Convert service metadata into a [`FileMatch`], dropping entries without a path.
    pub(crate) fn into_match(self) -> Option<FileMatch> {
        let path = self.path_display.or(self.path_lower)?;
        let kind = match self.tag.as_str() {
            "file" => EntryKind::File,
            "folder" => EntryKind::Folder,
            _ => EntryKind::Other,
        };
        Some(FileMatch {
            path,
            name: self.name,
            kind,
        })
    }
}
