//! HTTP client wrapper for the Notion pages API.

use crate::config::Config;
use crate::notes::payload::{AnswerRecord, build_update_body};
use crate::notes::{NotesClient, NotesError};
use async_trait::async_trait;
use reqwest::Client;

/// Notion client that writes answers into page properties.
pub struct NotionClient {
    pub(crate) http: Client,
    pub(crate) base_url: String,
    pub(crate) token: String,
    pub(crate) version: String,
    pub(crate) result_property: String,
    pub(crate) timestamp_property: String,
}

impl NotionClient {
    /// Construct a client from the loaded configuration.
    pub fn new(config: &Config) -> Result<Self, NotesError> {
        let http = Client::builder().user_agent("docbridge/0.1").build()?;
        tracing::debug!(
            base_url = %config.notion_api_url,
            version = %config.notion_version,
            result_property = %config.notion_result_property,
            timestamp_property = %config.notion_timestamp_property,
            has_token = !config.notion_token.is_empty(),
            "Initialized Notion HTTP client"
        );
        Ok(Self {
            http,
            base_url: config.notion_api_url.clone(),
            token: config.notion_token.clone(),
            version: config.notion_version.clone(),
            result_property: config.notion_result_property.clone(),
            timestamp_property: config.notion_timestamp_property.clone(),
        })
    }

    fn page_url(&self, page_id: &str) -> String {
        format!("{}/v1/pages/{}", self.base_url.trim_end_matches('/'), page_id)
    }
}

#[async_trait]
impl NotesClient for NotionClient {
    async fn update_record(&self, page_id: &str, record: &AnswerRecord) -> Result<(), NotesError> {
        let body = build_update_body(&self.result_property, &self.timestamp_property, record);
        let response = self
            .http
            .patch(self.page_url(page_id))
            .bearer_auth(&self.token)
            .header("Notion-Version", &self.version)
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            tracing::debug!(page_id, timestamp = %record.generated_at, "Page updated");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = NotesError::UnexpectedStatus { status, body };
            tracing::error!(page_id, error = %error, "Page update failed");
            Err(error)
        }
    }
}
