// src/pipeline.rs
//! Pipeline capability traits — abstract the three stages of the harvest pipeline.
//!
//! Each trait describes a single capability, enabling testing each stage in isolation.

use crate::error::AppError;
use crate::model::ReviewRecord;
use crate::versioning::VersionRepairReport;
use std::path::PathBuf;

/// Harvests the review dataset from the feed.
#[async_trait::async_trait]
pub trait ReviewSource {
    async fn harvest(&self) -> Result<Vec<ReviewRecord>, AppError>;
}

/// Repairs missing version labels on a harvested dataset.
pub trait VersionRepair {
    fn repair(&self, records: Vec<ReviewRecord>) -> (Vec<ReviewRecord>, VersionRepairReport);
}

/// Delivers the cleaned dataset to its destination file.
pub trait DatasetDelivery {
    fn deliver(&self, records: &[ReviewRecord]) -> Result<PathBuf, AppError>;
}
