//! Document ingestion.
//!
//! Uploaded files and pasted text are normalized into plain text here. Loading
//! never fails outward: a file that cannot be read turns into an explanatory
//! string that flows through the pipeline as content.

use std::io::Cursor;
use std::path::Path;

use calamine::{Reader, open_workbook_auto_from_rs};
use thiserror::Error;
use tracing::warn;

use crate::text::non_blank;

pub const TABLE_ROW_LIMIT: usize = 50;
pub const PDF_PAGE_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    File { filename: String, bytes: Vec<u8> },
    Pasted(String),
}

impl DocumentSource {
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::File { filename, bytes })
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::File { filename, .. } => filename,
            Self::Pasted(_) => "pasted text",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Csv,
    Spreadsheet,
    Pdf,
    Text,
}

impl DocumentKind {
    fn from_filename(filename: &str) -> Self {
        let ext = Path::new(filename)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => Self::Csv,
            Some("xls" | "xlsx" | "xlsm" | "ods") => Self::Spreadsheet,
            Some("pdf") => Self::Pdf,
            _ => Self::Text,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum ExtractError {
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("pdf: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("not valid UTF-8 text: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("workbook has no worksheet")]
    NoWorksheet,
}

#[must_use]
pub fn load_document(source: &DocumentSource) -> String {
    match source {
        DocumentSource::Pasted(text) => text.clone(),
        DocumentSource::File { filename, bytes } => match extract_file(filename, bytes) {
            Ok(text) => text,
            Err(err) => {
                warn!(filename = %filename, error = %err, "document ingestion failed");
                format!("Failed to read {filename}: {err}")
            }
        },
    }
}

/// Pasted text wins over an uploaded file when both are supplied.
#[must_use]
pub fn resolve_internal_input(pasted: Option<&str>, file: Option<&DocumentSource>) -> String {
    if let Some(pasted) = non_blank(pasted) {
        return pasted.to_string();
    }
    file.map(load_document).unwrap_or_default()
}

fn extract_file(filename: &str, bytes: &[u8]) -> Result<String, ExtractError> {
    match DocumentKind::from_filename(filename) {
        DocumentKind::Csv => csv_table(bytes),
        DocumentKind::Spreadsheet => spreadsheet_table(bytes),
        DocumentKind::Pdf => pdf_text(bytes, Some(PDF_PAGE_LIMIT)),
        DocumentKind::Text => Ok(std::str::from_utf8(bytes)?.to_string()),
    }
}

fn csv_table(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    let mut rows = Vec::new();
    for record in reader.records().take(TABLE_ROW_LIMIT + 1) {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }
    Ok(render_table(&rows))
}

fn spreadsheet_table(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ExtractError::NoWorksheet)??;
    let rows = range
        .rows()
        .take(TABLE_ROW_LIMIT + 1)
        .map(|row| row.iter().map(ToString::to_string).collect::<Vec<_>>())
        .collect::<Vec<_>>();
    Ok(render_table(&rows))
}

/// Text of each page in order; pages that fail to extract are skipped.
pub(crate) fn pdf_text(bytes: &[u8], page_limit: Option<usize>) -> Result<String, ExtractError> {
    let document = lopdf::Document::load_mem(bytes)?;
    let pages = document.get_pages();
    let limit = page_limit.unwrap_or(usize::MAX);
    let mut out = Vec::new();
    for page_number in pages.keys().take(limit) {
        match document.extract_text(&[*page_number]) {
            Ok(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    out.push(text.to_string());
                }
            }
            Err(err) => warn!(page = page_number, error = %err, "skipping unreadable pdf page"),
        }
    }
    Ok(out.join("\n"))
}

// First row is the header; data rows get a zero-based index column.
fn render_table(rows: &[Vec<String>]) -> String {
    let Some((header, data)) = rows.split_first() else {
        return String::new();
    };
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let index_width = data.len().saturating_sub(1).to_string().len();

    let mut widths = vec![0usize; columns];
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len());
    lines.push(render_row(&" ".repeat(index_width), header, &widths));
    for (idx, row) in data.iter().enumerate() {
        lines.push(render_row(
            &format!("{idx:>index_width$}"),
            row,
            &widths,
        ));
    }
    lines.join("\n")
}

fn render_row(index: &str, row: &[String], widths: &[usize]) -> String {
    let mut line = index.to_string();
    for (idx, width) in widths.iter().enumerate() {
        let cell = row.get(idx).map_or("", String::as_str);
        line.push_str("  ");
        let pad = width.saturating_sub(cell.chars().count());
        line.push_str(&" ".repeat(pad));
        line.push_str(cell);
    }
    line.trim_end().to_string()
}
