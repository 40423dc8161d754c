#![deny(missing_docs)]

//! Core library for the DocBridge webhook: searches Dropbox, extracts document text, asks a
//! chat model and writes the answer back to a Notion page.

/// HTTP routing and webhook handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Text extraction for PDF, DOCX, XLSX and PPTX documents.
pub mod extraction;
/// Chat-completion client abstraction and the OpenAI adapter.
pub mod llm;
/// Structured logging and tracing setup.
pub mod logging;
/// Pipeline counters.
pub mod metrics;
/// Notion record updates.
pub mod notes;
/// Webhook pipeline orchestration.
pub mod pipeline;
/// Dropbox search and download.
pub mod storage;
