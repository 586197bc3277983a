// src/lib.rs
//! reviews2csv library — harvests App Store RSS reviews, repairs missing
//! version labels, and exports flat-file datasets.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling** — `AppError`
//! - **Configuration** — `CommandLineInput`, `PipelineConfig`
//! - **Domain model** — `ReviewRecord`, `VersionInterval`
//! - **Feed access** — `FeedHttpClient`, `RssPageFetcher`, `FetchController`,
//!   `PageOutcome`, `FetchPolicy`, `DateWindow`, `CancelToken`
//! - **Version inference** — `VersionTimeline`, `backfill_versions`
//! - **Export** — `ExportFormat`, `write_dataset`

mod config;
mod constants;
mod error;
mod export;
mod feed;
mod model;
mod pipeline;
mod summary;
mod versioning;

// --- Error Handling ---
pub use crate::error::AppError;

// --- Configuration ---
pub use crate::config::{CommandLineInput, PipelineConfig};
pub use crate::constants::UNKNOWN_VERSION;

// --- Domain Model ---
pub use crate::model::{ReviewRecord, VersionInterval};

// --- Feed Access ---
pub use crate::feed::{
    CancelToken, DateWindow, DelayRange, FeedHttpClient, FetchController, FetchPolicy,
    FetchSession, PageOutcome, ProgressCallback, ReviewFeed, RssPageFetcher,
};

// --- Version Inference ---
pub use crate::versioning::{
    backfill_versions, is_version_higher, VersionRepairReport, VersionTimeline, VersionTokens,
};

// --- Export & Reporting ---
pub use crate::export::{render_csv, render_json, render_txt, write_dataset, ExportFormat};
pub use crate::summary::DatasetSummary;

// --- Pipeline Traits ---
pub use crate::pipeline::{DatasetDelivery, ReviewSource, VersionRepair};
