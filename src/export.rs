// src/export.rs
//! Flat-file export of the cleaned dataset: CSV, JSON, or a plain-text
//! review listing. Dates are flattened to `YYYY-MM-DD` on the way out;
//! records whose timestamp never parsed keep their raw value.

use crate::error::AppError;
use crate::model::ReviewRecord;
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Txt,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Txt => "txt",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Flattened row shape shared by the CSV and JSON exports.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    id: &'a str,
    title: &'a str,
    author: &'a str,
    rating: u8,
    content: &'a str,
    date: String,
    version: &'a str,
    page: u32,
    platform: &'a str,
}

impl<'a> ExportRow<'a> {
    fn from_record(record: &'a ReviewRecord) -> Self {
        Self {
            id: &record.id,
            title: &record.title,
            author: &record.author,
            rating: record.rating,
            content: &record.content,
            date: export_date(record),
            version: &record.version,
            page: record.source_page,
            platform: &record.platform,
        }
    }
}

/// `YYYY-MM-DD`, or the raw feed value when the timestamp never parsed.
fn export_date(record: &ReviewRecord) -> String {
    match record.published_at {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => record.published_raw.clone(),
    }
}

pub fn render_csv(records: &[ReviewRecord]) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(ExportRow::from_record(record))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Validation(format!("CSV buffer error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Validation(format!("CSV encoding: {}", e)))
}

pub fn render_json(records: &[ReviewRecord]) -> Result<String, AppError> {
    let rows: Vec<ExportRow<'_>> = records.iter().map(ExportRow::from_record).collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

pub fn render_txt(records: &[ReviewRecord]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&format!("Review: {}\n", record.content));
        out.push_str(&format!("Rating: {}\n", record.rating));
        out.push_str(&format!("Version: {}\n", record.version));
        out.push_str(&format!("Author: {}\n", record.author));
        out.push_str(&format!("Date: {}\n", export_date(record)));
        out.push_str("---\n");
    }
    out
}

/// Renders and writes the dataset in the requested format.
pub fn write_dataset(
    records: &[ReviewRecord],
    format: ExportFormat,
    path: &Path,
) -> Result<(), AppError> {
    let rendered = match format {
        ExportFormat::Csv => render_csv(records)?,
        ExportFormat::Json => render_json(records)?,
        ExportFormat::Txt => render_txt(records),
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, rendered)?;
    log::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}
