//! Webhook pipeline coordinating search, extraction, completion and persistence.

use crate::{
    config::Config,
    extraction::{ExtractorRegistry, UNSUPPORTED_FORMAT, extract_blocking},
    llm::{CompletionClient, OpenAiClient, build_prompt},
    metrics::{MetricsSnapshot, PipelineMetrics},
    notes::{AnswerRecord, NotesClient, NotionClient},
    pipeline::types::{
        ExtractedText, NO_MATCHES_RESULT, PipelineError, PipelineOutcome, SearchQuery,
        combine_texts,
    },
    storage::{DropboxClient, FileMatch, FileStore},
};
use async_trait::async_trait;
use std::sync::Arc;

/// Runs one linear pass per webhook call: search, extract, synthesize, persist.
///
/// The service owns the three collaborator clients and the extractor registry. Construct it
/// once near process start and share it through an `Arc`; nothing in it is mutated per request
/// apart from the metrics counters.
pub struct WebhookPipeline {
    store: Box<dyn FileStore>,
    extractors: ExtractorRegistry,
    model: Box<dyn CompletionClient>,
    notes: Box<dyn NotesClient>,
    metrics: Arc<PipelineMetrics>,
}

/// Abstraction over the pipeline used by external surfaces (HTTP, CLI).
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Run the full pipeline for one request.
    async fn run(&self, request: SearchQuery) -> Result<PipelineOutcome, PipelineError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl WebhookPipeline {
    /// Assemble a pipeline from explicitly constructed collaborators.
    pub fn new(
        store: Box<dyn FileStore>,
        extractors: ExtractorRegistry,
        model: Box<dyn CompletionClient>,
        notes: Box<dyn NotesClient>,
    ) -> Self {
        Self {
            store,
            extractors,
            model,
            notes,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Build the production pipeline: Dropbox, OpenAI and Notion clients plus the default
    /// extractor registry.
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let store = DropboxClient::new(config)?;
        let model = OpenAiClient::new(config)?;
        let notes = NotionClient::new(config)?;
        let extractors = ExtractorRegistry::default();
        tracing::info!(formats = ?extractors.extensions(), "Pipeline initialized");
        Ok(Self::new(
            Box::new(store),
            extractors,
            Box::new(model),
            Box::new(notes),
        ))
    }

    /// Search the storage service for files matching `query`.
    pub async fn search(&self, query: &str) -> Result<Vec<FileMatch>, PipelineError> {
        let files = self.store.search(query).await?;
        tracing::info!(matches = files.len(), "Search completed");
        Ok(files)
    }

    /// Extract text from one match. Unsupported paths short-circuit to the sentinel without
    /// touching the storage service.
    pub async fn extract(&self, file: &FileMatch) -> Result<ExtractedText, PipelineError> {
        self.metrics.record_extraction();
        let text = match self.extractors.resolve(&file.path) {
            Some(extractor) => {
                let bytes = self.store.download(&file.path).await?;
                let text = extract_blocking(extractor, bytes).await?;
                tracing::debug!(name = %file.name, chars = text.len(), "Extracted text");
                text
            }
            None => {
                tracing::debug!(name = %file.name, kind = ?file.kind, "Unsupported file format");
                UNSUPPORTED_FORMAT.to_string()
            }
        };
        Ok(ExtractedText {
            path: file.path.clone(),
            text,
        })
    }

    /// Extract every match in order, one at a time.
    pub async fn extract_all(
        &self,
        files: &[FileMatch],
    ) -> Result<Vec<ExtractedText>, PipelineError> {
        let mut texts = Vec::with_capacity(files.len());
        for file in files {
            texts.push(self.extract(file).await?);
        }
        Ok(texts)
    }

    /// Ask the model to answer `query` over the combined extracted text.
    pub async fn synthesize(
        &self,
        query: &str,
        texts: &[ExtractedText],
    ) -> Result<String, PipelineError> {
        let sources: Vec<&str> = texts.iter().map(|extracted| extracted.path.as_str()).collect();
        tracing::debug!(?sources, "Building prompt");
        let prompt = build_prompt(query, &combine_texts(texts));
        let answer = self.model.complete(&prompt).await?;
        tracing::info!(
            prompt_chars = prompt.len(),
            answer_chars = answer.len(),
            "Model answered"
        );
        Ok(answer)
    }

    /// Write `text` and the current timestamp into record `page_id`.
    pub async fn persist(&self, page_id: &str, text: &str) -> Result<AnswerRecord, PipelineError> {
        let record = AnswerRecord::now(text);
        self.notes.update_record(page_id, &record).await?;
        self.metrics.record_answer();
        tracing::info!(page_id, timestamp = %record.generated_at, "Record updated");
        Ok(record)
    }

    /// Run the full pipeline for one request.
    pub async fn run(&self, request: SearchQuery) -> Result<PipelineOutcome, PipelineError> {
        self.metrics.record_request();
        let SearchQuery { query, page_id } = request;

        let files = self.search(&query).await?;
        if files.is_empty() {
            self.metrics.record_no_matches();
            self.persist(&page_id, NO_MATCHES_RESULT).await?;
            return Ok(PipelineOutcome::NoFiles);
        }

        let texts = self.extract_all(&files).await?;
        let result = self.synthesize(&query, &texts).await?;
        self.persist(&page_id, &result).await?;

        Ok(PipelineOutcome::Answered {
            result,
            files: files.len(),
        })
    }

    /// Return the current metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl PipelineApi for WebhookPipeline {
    async fn run(&self, request: SearchQuery) -> Result<PipelineOutcome, PipelineError> {
        WebhookPipeline::run(self, request).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        WebhookPipeline::metrics_snapshot(self)
    }
}
