//! Dropbox file-storage integration.

pub mod client;
pub mod types;

use async_trait::async_trait;

pub use client::DropboxClient;
pub use types::{EntryKind, FileMatch, StorageError};

/// Storage operations the pipeline depends on.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Find entries matching a free-text query, in service order. No matches is `Ok(vec![])`.
    async fn search(&self, query: &str) -> Result<Vec<FileMatch>, StorageError>;

    /// Read the full contents of the file at `path`.
    async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError>;
}
