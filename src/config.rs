// src/config.rs
use crate::constants::{PAGE_BUDGET_MARGIN, REVIEWS_PER_PAGE_ESTIMATE};
use crate::error::AppError;
use crate::export::ExportFormat;
use crate::feed::{DateWindow, DelayRange};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Parsed and validated command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Numeric App Store app identifier (e.g. 1360892562)
    pub app_id: u64,

    /// Two-letter storefront region code (e.g. 'us', 'tr', 'de')
    #[arg(short, long, default_value = "us")]
    pub region: String,

    /// Maximum number of feed pages to request
    #[arg(long, default_value_t = 30)]
    pub max_pages: u32,

    /// Minimum politeness delay before each request, in seconds
    #[arg(long, default_value_t = 2.0)]
    pub delay_min: f64,

    /// Maximum politeness delay before each request, in seconds
    #[arg(long, default_value_t = 4.0)]
    pub delay_max: f64,

    /// Keep only reviews published on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<String>,

    /// Keep only reviews published on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<String>,

    /// Stop after collecting this many reviews
    #[arg(long)]
    pub max_reviews: Option<usize>,

    /// Output file path (defaults to reviews_<app>_<timestamp>.<ext>)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Export format
    #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
    pub format: ExportFormat,

    /// Skip version-label repair (timeline inference and backfilling)
    #[arg(long, default_value_t = false)]
    pub no_version_fix: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Resolved pipeline configuration — validated and ready to drive the
/// fetch, repair, and export stages.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub app_id: u64,
    pub region: String,
    pub max_pages: u32,
    pub delay: DelayRange,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub max_reviews: Option<usize>,
    pub output_file: Option<PathBuf>,
    pub format: ExportFormat,
    pub version_fix: bool,
    pub verbose: bool,
}

impl PipelineConfig {
    /// Resolves a complete pipeline configuration from CLI input. Malformed
    /// date filters fail here, before any network activity.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        if cli.app_id == 0 {
            return Err(AppError::Validation("app id must be positive".to_string()));
        }

        let region = cli.region.trim().to_ascii_lowercase();
        if region.len() != 2 || !region.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(AppError::Validation(format!(
                "region must be a two-letter code, got '{}'",
                cli.region
            )));
        }

        let start_date = cli.start_date.as_deref().map(parse_date_filter).transpose()?;
        let end_date = cli.end_date.as_deref().map(parse_date_filter).transpose()?;
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(AppError::Validation(format!(
                    "start date {} is after end date {}",
                    start, end
                )));
            }
        }

        Ok(PipelineConfig {
            app_id: cli.app_id,
            region,
            max_pages: cli.max_pages,
            delay: DelayRange::new(cli.delay_min, cli.delay_max),
            start_date,
            end_date,
            max_reviews: cli.max_reviews,
            output_file: cli.output.map(PathBuf::from),
            format: cli.format,
            version_fix: !cli.no_version_fix,
            verbose: cli.verbose,
        })
    }

    pub fn date_window(&self) -> DateWindow {
        DateWindow::new(self.start_date, self.end_date)
    }

    /// Page budget, shrunk when a review limit makes most of it pointless:
    /// the feed yields roughly fifteen reviews per page, plus a safety
    /// margin.
    pub fn effective_max_pages(&self) -> u32 {
        match self.max_reviews {
            Some(max_reviews) if max_reviews > 0 => {
                let estimated = max_reviews.div_ceil(REVIEWS_PER_PAGE_ESTIMATE) as u32
                    + PAGE_BUDGET_MARGIN;
                self.max_pages.min(estimated)
            }
            _ => self.max_pages,
        }
    }
}

fn parse_date_filter(input: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| AppError::InvalidDateFilter {
        input: input.to_string(),
    })
}
