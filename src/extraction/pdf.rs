//! PDF text extraction.

use crate::extraction::ExtractionError;

/// Extract the text of every page, skipping pages without text, joined by newlines.
pub fn extract(data: &[u8]) -> Result<String, ExtractionError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(data)
        .map_err(|error| ExtractionError::parse("pdf", error))?;
    tracing::debug!(pages = pages.len(), "Extracted PDF pages");
    Ok(join_pages(pages))
}

fn join_pages(pages: Vec<String>) -> String {
    pages
        .into_iter()
        .filter(|page| !page.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
