//! HTTP client wrapper for the Dropbox API.

use crate::config::Config;
use crate::storage::types::{FileMatch, MetadataV2, SearchV2Response, StorageError};
use crate::storage::FileStore;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::json;

const DROPBOX_API_ARG: &str = "Dropbox-API-Arg";

/// Lightweight HTTP client for Dropbox search and download.
pub struct DropboxClient {
    pub(crate) client: Client,
    pub(crate) api_url: String,
    pub(crate) content_url: String,
    pub(crate) access_token: String,
}

impl DropboxClient {
    /// Construct a new client from the loaded configuration.
    pub fn new(config: &Config) -> Result<Self, StorageError> {
        let client = Client::builder().user_agent("docbridge/0.1").build()?;
        tracing::debug!(
            api_url = %config.dropbox_api_url,
            content_url = %config.dropbox_content_url,
            has_token = !config.dropbox_access_token.is_empty(),
            "Initialized Dropbox HTTP client"
        );
        Ok(Self {
            client,
            api_url: config.dropbox_api_url.clone(),
            content_url: config.dropbox_content_url.clone(),
            access_token: config.dropbox_access_token.clone(),
        })
    }

    /// Search the whole account for entries matching `query`.
    ///
    /// Only the first result page is returned.
    pub async fn search(&self, query: &str) -> Result<Vec<FileMatch>, StorageError> {
        let body = json!({
            "query": query,
            "options": { "path": "" },
        });

        let response = self
            .request(&self.api_url, "2/files/search_v2")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = StorageError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Dropbox search failed");
            return Err(error);
        }

        let payload: SearchV2Response = response.json().await?;
        if payload.has_more {
            tracing::debug!(query, "Dropbox reported more results; only the first page is used");
        }

        let matches: Vec<FileMatch> = payload
            .matches
            .into_iter()
            .filter_map(|hit| match hit.metadata {
                MetadataV2::Metadata { metadata } => metadata.into_match(),
                MetadataV2::Other => None,
            })
            .collect();
        tracing::debug!(query, matches = matches.len(), "Dropbox search completed");
        Ok(matches)
    }

    /// Download the full contents of the file at `path`.
    pub async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let arg = api_arg_header(path)?;
        let response = self
            .request(&self.content_url, "2/files/download")
            .header(DROPBOX_API_ARG, arg)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = StorageError::UnexpectedStatus { status, body };
            tracing::error!(path, error = %error, "Dropbox download failed");
            return Err(error);
        }

        let bytes = response.bytes().await?;
        tracing::debug!(path, bytes = bytes.len(), "Downloaded file");
        Ok(bytes.to_vec())
    }

    fn request(&self, base: &str, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", base.trim_end_matches('/'), path);
        self.client.post(url).bearer_auth(&self.access_token)
    }
}

#[async_trait]
impl FileStore for DropboxClient {
    async fn search(&self, query: &str) -> Result<Vec<FileMatch>, StorageError> {
        DropboxClient::search(self, query).await
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        DropboxClient::download(self, path).await
    }
}

/// Serialize the `Dropbox-API-Arg` header value, escaping non-ASCII characters as `\uXXXX`.
pub(crate) fn api_arg_header(path: &str) -> Result<String, StorageError> {
    let raw = serde_json::to_string(&json!({ "path": path }))?;
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_ascii() {
            escaped.push(ch);
        } else {
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                escaped.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    Ok(escaped)
}
