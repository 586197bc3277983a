// src/versioning/timeline.rs
//! Release-timeline reconstruction from noisy version labels.
//!
//! Observation order is not trustworthy: users misreport versions and old
//! reviews surface late. The timeline treats "strictly increasing version
//! number" as ground truth — labels are ordered by the date they were first
//! seen, and any label that fails to advance past the last accepted one is
//! quarantined as an anomaly instead of being corrected or discarded.

use crate::model::{ReviewRecord, VersionInterval};
use crate::versioning::ordering::is_version_higher;
use chrono::NaiveDate;
use indexmap::IndexMap;

/// A version label paired with the date it was first observed.
pub type DatedVersion = (String, NaiveDate);

/// The reconstructed release timeline for one dataset.
#[derive(Debug, Clone, Default)]
pub struct VersionTimeline {
    /// Labels ordered by first-seen date whose version numbers strictly
    /// increase. These are the only labels used for backfilling.
    pub valid_progression: Vec<DatedVersion>,
    /// Labels whose first-seen date contradicts version order. Presumed
    /// data-entry noise; retained verbatim wherever they appear on records.
    pub anomalies: Vec<DatedVersion>,
}

impl VersionTimeline {
    /// Builds the timeline from every record carrying a non-empty version
    /// label and a parseable date.
    pub fn build(records: &[ReviewRecord]) -> Self {
        // IndexMap keeps encounter order so the later stable sort breaks
        // first-seen-date ties by observation order.
        let mut first_seen: IndexMap<String, NaiveDate> = IndexMap::new();
        for record in records {
            if record.version_missing() {
                continue;
            }
            let Some(date) = record.published_date() else {
                continue;
            };
            first_seen
                .entry(record.version.clone())
                .and_modify(|seen| {
                    if date < *seen {
                        *seen = date;
                    }
                })
                .or_insert(date);
        }

        let mut ordered: Vec<DatedVersion> = first_seen.into_iter().collect();
        ordered.sort_by_key(|(_, date)| *date);

        let mut valid_progression: Vec<DatedVersion> = Vec::new();
        let mut anomalies: Vec<DatedVersion> = Vec::new();

        for (version, date) in ordered {
            match valid_progression.last() {
                None => valid_progression.push((version, date)),
                Some((last_valid, _)) => {
                    if is_version_higher(&version, last_valid) {
                        valid_progression.push((version, date));
                    } else {
                        anomalies.push((version, date));
                    }
                }
            }
        }

        log::debug!(
            "Version timeline: {} valid, {} anomalous labels",
            valid_progression.len(),
            anomalies.len()
        );

        Self {
            valid_progression,
            anomalies,
        }
    }

    /// Materializes the progression as half-open intervals. Entry `i` spans
    /// from its first-seen date to the next entry's; the final interval ends
    /// at the maximum observed date in the dataset (closed at that end).
    pub fn intervals(&self, records: &[ReviewRecord]) -> Vec<VersionInterval> {
        if self.valid_progression.is_empty() {
            return Vec::new();
        }

        let max_date = records
            .iter()
            .filter_map(ReviewRecord::published_date)
            .max()
            // The progression is non-empty, so at least one dated record exists
            .unwrap_or(self.valid_progression[self.valid_progression.len() - 1].1);

        self.valid_progression
            .iter()
            .enumerate()
            .map(|(i, (version, start))| {
                let end = match self.valid_progression.get(i + 1) {
                    Some((_, next_start)) => *next_start,
                    None => max_date.max(*start),
                };
                VersionInterval {
                    version: version.clone(),
                    start: *start,
                    end,
                }
            })
            .collect()
    }
}
