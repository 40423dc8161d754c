//! Webhook pipeline: search, extract, synthesize, persist.

mod service;
pub mod types;

pub use service::{PipelineApi, WebhookPipeline};
pub use types::{
    ExtractedText, NO_MATCHES_RESULT, PipelineError, PipelineOutcome, SearchQuery, combine_texts,
};
