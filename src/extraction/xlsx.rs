//! Spreadsheet (XLSX) text extraction.
//!
//! The first worksheet is rendered as a fixed-width table: the first row supplies the column
//! headers and each following row is prefixed with its zero-based index, e.g.
//!
//! ```text
//!     Name  Qty
//! 0  apple    3
//! 1   kiwi   12
//! ```
//!
//! A sheet with no data rows renders as `Empty DataFrame` followed by its column list.

use crate::extraction::ExtractionError;
use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
use std::io::Cursor;

/// Render the first worksheet of the workbook as a text table.
pub fn extract(data: &[u8]) -> Result<String, ExtractionError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(data))
        .map_err(|error| ExtractionError::parse("xlsx", error))?;

    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        return Ok(String::new());
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|error| ExtractionError::parse("xlsx", error))?;

    let rows: Vec<Vec<Option<String>>> = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    tracing::debug!(sheet = %sheet_name, rows = rows.len(), "Extracted worksheet");
    Ok(render_table(rows))
}

fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::String(value) => value.clone(),
        Data::Float(value) => format_float(*value),
        Data::Int(value) => value.to_string(),
        Data::Bool(value) => (if *value { "True" } else { "False" }).to_string(),
        Data::DateTime(value) => value.to_string(),
        Data::DateTimeIso(value) | Data::DurationIso(value) => value.clone(),
        _ => return None,
    };
    Some(text)
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn render_table(rows: Vec<Vec<Option<String>>>) -> String {
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        return render_empty(&[]);
    };
    let body: Vec<Vec<Option<String>>> = rows.collect();
    let columns = body
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0);

    let header: Vec<String> = (0..columns)
        .map(|col| {
            header
                .get(col)
                .cloned()
                .flatten()
                .unwrap_or_else(|| format!("Unnamed: {col}"))
        })
        .collect();
    if body.is_empty() {
        return render_empty(&header);
    }
    let body: Vec<Vec<String>> = body
        .into_iter()
        .map(|row| {
            (0..columns)
                .map(|col| row.get(col).cloned().flatten().unwrap_or_else(|| "NaN".into()))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|cell| cell.chars().count()).collect();
    for row in &body {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    let index_width = body.len().saturating_sub(1).to_string().len();

    let mut lines = Vec::with_capacity(body.len() + 1);
    lines.push(render_line(&" ".repeat(index_width), &header, &widths));
    for (index, row) in body.iter().enumerate() {
        let label = format!("{index:<index_width$}");
        lines.push(render_line(&label, row, &widths));
    }
    lines.join("\n")
}

/// Sheets without data rows print like an empty data frame.
fn render_empty(header: &[String]) -> String {
    format!("Empty DataFrame\nColumns: [{}]\nIndex: []", header.join(", "))
}

fn render_line(label: &str, cells: &[String], widths: &[usize]) -> String {
    let mut line = label.to_string();
    for (cell, width) in cells.iter().zip(widths) {
        line.push_str("  ");
        line.push_str(&format!("{cell:>width$}"));
    }
    line
}
