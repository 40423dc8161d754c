//! Helpers for constructing Notion page-update payloads.

use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::macros::format_description;

/// Notion rejects rich-text objects longer than this many characters.
pub(crate) const RICH_TEXT_LIMIT: usize = 2000;

/// Answer text plus the moment it was produced, ready to be written to a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    /// Text written to the result property.
    pub text: String,
    /// Local timestamp formatted `YYYY-MM-DDTHH:MM:SS`.
    pub generated_at: String,
}

impl AnswerRecord {
    /// Stamp `text` with the current local time.
    pub fn now(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            generated_at: local_timestamp(),
        }
    }
}

/// Current local time as `YYYY-MM-DDTHH:MM:SS`, falling back to UTC when the local offset is
/// unavailable.
pub fn local_timestamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    format_timestamp(now)
}

pub(crate) fn format_timestamp(at: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    at.format(format)
        .unwrap_or_else(|_| "1970-01-01T00:00:00".to_string())
}

/// Build the `PATCH /v1/pages/{id}` body setting the result and timestamp properties.
pub(crate) fn build_update_body(
    result_property: &str,
    timestamp_property: &str,
    record: &AnswerRecord,
) -> Value {
    let mut rich_text = Map::new();
    rich_text.insert(
        "rich_text".into(),
        Value::Array(rich_text_segments(&record.text)),
    );

    let mut start = Map::new();
    start.insert("start".into(), Value::String(record.generated_at.clone()));
    let mut date = Map::new();
    date.insert("date".into(), Value::Object(start));

    let mut properties = Map::new();
    properties.insert(result_property.to_string(), Value::Object(rich_text));
    properties.insert(timestamp_property.to_string(), Value::Object(date));

    let mut body = Map::new();
    body.insert("properties".into(), Value::Object(properties));
    Value::Object(body)
}

/// Split `text` into rich-text objects of at most [`RICH_TEXT_LIMIT`] characters. Empty text
/// still produces one (empty) object.
fn rich_text_segments(text: &str) -> Vec<Value> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![text_object(String::new())];
    }
    chars
        .chunks(RICH_TEXT_LIMIT)
        .map(|chunk| text_object(chunk.iter().collect()))
        .collect()
}

fn text_object(content: String) -> Value {
    let mut text = Map::new();
    text.insert("content".into(), Value::String(content));
    let mut object = Map::new();
    object.insert("text".into(), Value::Object(text));
    Value::Object(object)
}
