//! Word-processing document (DOCX) text extraction.

use crate::extraction::ExtractionError;
use docx_rs::{DocumentChild, Paragraph, ParagraphChild, RunChild};

/// Extract body paragraphs joined by newlines. Tables and other block content are ignored.
pub fn extract(data: &[u8]) -> Result<String, ExtractionError> {
    let document =
        docx_rs::read_docx(data).map_err(|error| ExtractionError::parse("docx", error))?;

    let paragraphs: Vec<String> = document
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(paragraph) => Some(paragraph_text(paragraph)),
            _ => None,
        })
        .collect();

    Ok(paragraphs.join("\n"))
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    push_children(&paragraph.children, &mut text);
    text
}

/// Runs are read directly and through hyperlinks, which wrap their own runs.
fn push_children(children: &[ParagraphChild], text: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for run_child in &run.children {
                    match run_child {
                        RunChild::Text(t) => text.push_str(&t.text),
                        RunChild::Tab(_) => text.push('\t'),
                        RunChild::Break(_) => text.push('\n'),
                        _ => {}
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => push_children(&link.children, text),
            _ => {}
        }
    }
}
