// src/main.rs

// Modules defined in the crate
mod config;
mod constants;
mod error;
mod export;
mod feed;
mod model;
mod pipeline;
mod summary;
mod versioning;

use crate::config::{CommandLineInput, PipelineConfig};
use crate::error::AppError;
use crate::feed::{FeedHttpClient, FetchController, RssPageFetcher};
use crate::model::ReviewRecord;
use crate::pipeline::{DatasetDelivery, ReviewSource, VersionRepair};
use crate::summary::DatasetSummary;
use crate::versioning::{backfill_versions, VersionRepairReport, VersionTimeline};
use chrono::Local;
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use std::fs;
use std::path::PathBuf;

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let log_file_path = std::env::temp_dir().join("reviews2csv.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let stdout_appender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stdout")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::debug!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Executes the three-stage pipeline: harvest → repair → deliver.
async fn execute_pipeline(config: &PipelineConfig) -> Result<(), AppError> {
    let pipeline = ReviewsToDataset::new(config);

    let records = pipeline.harvest().await?;
    if records.is_empty() {
        println!("No reviews collected — nothing to export.");
        return Ok(());
    }

    let (records, repair_report) = if config.version_fix {
        pipeline.repair(records)
    } else {
        log::info!("Version repair skipped (--no-version-fix)");
        (records, VersionRepairReport::default())
    };

    let path = pipeline.deliver(&records)?;
    pipeline.report_completion(&records, &repair_report, &path);

    Ok(())
}

/// Orchestrates harvesting, version repair, and export of one app's reviews.
struct ReviewsToDataset<'a> {
    config: &'a PipelineConfig,
}

impl<'a> ReviewsToDataset<'a> {
    fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    fn default_output_path(&self) -> PathBuf {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        PathBuf::from(format!(
            "reviews_{}_{}.{}",
            self.config.app_id,
            timestamp,
            self.config.format.extension()
        ))
    }

    /// Reports completion to the user with stats and the output location.
    fn report_completion(
        &self,
        records: &[ReviewRecord],
        repair: &VersionRepairReport,
        path: &std::path::Path,
    ) {
        let stats = DatasetSummary::measure(records);

        println!("📱 Collected {} reviews.", stats.total_reviews);
        if let Some(avg) = stats.average_rating {
            println!("   Average rating: {:.1} ⭐", avg);
        }
        if stats.unique_authors > 0 {
            println!("   Unique authors: {}", stats.unique_authors);
        }
        if let Some((first, last)) = stats.page_span {
            println!("   Pages: {}-{}", first, last);
        }
        if let (Some(oldest), Some(newest)) = (stats.oldest, stats.newest) {
            println!(
                "   Date range: {} → {}",
                oldest.format("%Y-%m-%d"),
                newest.format("%Y-%m-%d")
            );
        }
        if repair.updated > 0 {
            println!(
                "   Versions backfilled: {} ({} valid versions, {} anomalies)",
                repair.updated, repair.valid_versions, repair.anomalous_versions
            );
        }
        println!("✓ Dataset saved to {}", path.display());
    }
}

#[async_trait::async_trait]
impl ReviewSource for ReviewsToDataset<'_> {
    async fn harvest(&self) -> Result<Vec<ReviewRecord>, AppError> {
        let config = self.config;
        log::info!(
            "Harvesting reviews for app {} ({} storefront, up to {} pages)",
            config.app_id,
            config.region,
            config.effective_max_pages()
        );

        let client = FeedHttpClient::new()?;
        let fetcher = RssPageFetcher::new(client, config.app_id, config.region.clone(), config.delay);

        let mut controller = FetchController::new(fetcher).with_progress(Box::new(
            |page, max_pages, collected| {
                log::info!("Page {}/{} — {} reviews so far", page, max_pages, collected);
            },
        ));

        let records = controller
            .fetch_all(
                config.effective_max_pages(),
                config.date_window(),
                config.max_reviews,
            )
            .await;

        Ok(records)
    }
}

impl VersionRepair for ReviewsToDataset<'_> {
    fn repair(&self, records: Vec<ReviewRecord>) -> (Vec<ReviewRecord>, VersionRepairReport) {
        let timeline = VersionTimeline::build(&records);
        backfill_versions(records, &timeline)
    }
}

impl DatasetDelivery for ReviewsToDataset<'_> {
    fn deliver(&self, records: &[ReviewRecord]) -> Result<PathBuf, AppError> {
        let path = self
            .config
            .output_file
            .clone()
            .unwrap_or_else(|| self.default_output_path());
        export::write_dataset(records, self.config.format, &path)?;
        Ok(path)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)?;

    let config = PipelineConfig::resolve(cli)?;

    execute_pipeline(&config).await?;

    Ok(())
}
