// src/versioning/backfill.rs
//! Assignment of inferred version labels to records that have none.
//!
//! Only records with an empty label are touched. Labels the timeline
//! classified as anomalies are user-entered data and stay exactly as
//! observed.

use crate::constants::UNKNOWN_VERSION;
use crate::model::{ReviewRecord, VersionInterval};
use crate::versioning::timeline::VersionTimeline;
use chrono::NaiveDate;

/// Outcome summary of one backfill pass, for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionRepairReport {
    pub total_records: usize,
    pub missing_before: usize,
    pub updated: usize,
    pub valid_versions: usize,
    pub anomalous_versions: usize,
}

/// Fills every empty version label by locating the timeline interval the
/// record's date falls into. Records whose date matches no interval get the
/// version whose interval start is nearest in absolute day distance; records
/// with no usable date, or datasets with no valid progression at all, get
/// the `"Unknown"` sentinel. Returns the repaired records and a report.
pub fn backfill_versions(
    records: Vec<ReviewRecord>,
    timeline: &VersionTimeline,
) -> (Vec<ReviewRecord>, VersionRepairReport) {
    let intervals = timeline.intervals(&records);

    let mut report = VersionRepairReport {
        total_records: records.len(),
        valid_versions: timeline.valid_progression.len(),
        anomalous_versions: timeline.anomalies.len(),
        ..Default::default()
    };

    let records = records
        .into_iter()
        .map(|mut record| {
            if !record.version_missing() {
                return record;
            }
            report.missing_before += 1;
            record.version = infer_version(record.published_date(), &intervals);
            report.updated += 1;
            record
        })
        .collect();

    log::info!(
        "Version backfill: {} of {} records updated ({} valid versions, {} anomalies)",
        report.updated,
        report.total_records,
        report.valid_versions,
        report.anomalous_versions
    );

    (records, report)
}

fn infer_version(date: Option<NaiveDate>, intervals: &[VersionInterval]) -> String {
    let Some(date) = date else {
        return UNKNOWN_VERSION.to_string();
    };
    if intervals.is_empty() {
        return UNKNOWN_VERSION.to_string();
    }

    let last = intervals.len() - 1;
    for (i, interval) in intervals.iter().enumerate() {
        // The final interval is closed at its end date
        if interval.contains(date) || (i == last && date == interval.end) {
            return interval.version.clone();
        }
    }

    nearest_by_start(date, intervals)
}

/// Nearest-interval-start fallback for dates outside every interval
/// (typically predating the first observed release).
fn nearest_by_start(date: NaiveDate, intervals: &[VersionInterval]) -> String {
    let mut closest = &intervals[0];
    let mut min_distance = i64::MAX;

    for interval in intervals {
        let distance = (date - interval.start).num_days().abs();
        if distance < min_distance {
            min_distance = distance;
            closest = interval;
        }
    }

    closest.version.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(version: &str, date: &str) -> ReviewRecord {
        let published_at = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(9, 30, 0));
        ReviewRecord {
            id: String::new(),
            title: String::new(),
            author: String::new(),
            rating: 5,
            content: "review text".into(),
            published_raw: date.to_string(),
            published_at,
            version: version.to_string(),
            source_page: 1,
            platform: "rss".into(),
        }
    }

    fn versions(records: &[ReviewRecord]) -> Vec<&str> {
        records.iter().map(|r| r.version.as_str()).collect()
    }

    #[test]
    fn missing_versions_fill_from_their_interval() {
        let records = vec![
            record("1.0", "2024-01-01"),
            record("", "2024-01-10"),
            record("2.0", "2024-02-01"),
            record("", "2024-02-15"),
        ];
        let timeline = VersionTimeline::build(&records);
        let (filled, report) = backfill_versions(records, &timeline);

        // Jan 10 falls in [Jan 1, Feb 1); Feb 15 in [Feb 1, max date]
        assert_eq!(versions(&filled), vec!["1.0", "1.0", "2.0", "2.0"]);
        assert_eq!(report.missing_before, 2);
        assert_eq!(report.updated, 2);
    }

    #[test]
    fn date_before_first_interval_takes_nearest_start() {
        let records = vec![
            record("", "2023-12-30"),
            record("1.0", "2024-01-01"),
            record("2.0", "2024-06-01"),
        ];
        let timeline = VersionTimeline::build(&records);
        let (filled, _) = backfill_versions(records, &timeline);
        assert_eq!(filled[0].version, "1.0");
    }

    #[test]
    fn anomalous_labels_survive_backfill_verbatim() {
        let records = vec![
            record("1.0", "2024-01-01"),
            record("2.0", "2024-02-01"),
            record("1.5", "2024-03-01"),
            record("", "2024-03-10"),
        ];
        let timeline = VersionTimeline::build(&records);
        assert_eq!(timeline.anomalies.len(), 1);

        let (filled, _) = backfill_versions(records, &timeline);
        assert_eq!(filled[2].version, "1.5");
        // The gap record lands in 2.0's interval, not the anomaly's
        assert_eq!(filled[3].version, "2.0");
    }

    #[test]
    fn empty_progression_falls_back_to_unknown() {
        let records = vec![record("", "2024-01-01"), record("", "2024-02-01")];
        let timeline = VersionTimeline::build(&records);
        let (filled, report) = backfill_versions(records, &timeline);
        assert_eq!(versions(&filled), vec!["Unknown", "Unknown"]);
        assert_eq!(report.updated, 2);
    }

    #[test]
    fn undated_record_gets_unknown_sentinel() {
        let mut undated = record("", "garbage");
        undated.published_at = None;
        let records = vec![record("1.0", "2024-01-01"), undated];
        let timeline = VersionTimeline::build(&records);
        let (filled, _) = backfill_versions(records, &timeline);
        assert_eq!(filled[1].version, "Unknown");
    }

    #[test]
    fn no_record_is_left_without_a_label() {
        let records = vec![
            record("1.0", "2024-01-01"),
            record("", "2024-01-05"),
            record("", "bad-date"),
            record("3.0", "2024-04-01"),
            record("", "2024-12-31"),
        ];
        let timeline = VersionTimeline::build(&records);
        let (filled, _) = backfill_versions(records, &timeline);
        assert!(filled.iter().all(|r| !r.version_missing()));
    }
}
