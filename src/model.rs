// src/model.rs
//! Domain model for harvested reviews.
//!
//! `ReviewRecord` is the single normalized shape every feed entry is folded
//! into. All the defensive fallbacks live in the feed parser; once a record
//! exists, its fields are plain values — the only later mutation permitted
//! is version backfilling.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One user review, normalized from a raw feed entry.
///
/// Invariants maintained by the fetch layer:
/// - `content` is never empty in a record that survived the page filter;
/// - `rating` is always in `[0, 5]`, 0 meaning unknown;
/// - when a date filter was supplied, a parseable `published_at` lies
///   inside the requested window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Opaque feed identifier; may be empty and is not unique across pages.
    pub id: String,
    pub title: String,
    pub author: String,
    /// Star rating 0–5, 0 = unknown/unset.
    pub rating: u8,
    pub content: String,
    /// Timestamp exactly as the feed sent it.
    pub published_raw: String,
    /// Parsed timestamp; `None` when the raw value was unparseable.
    /// Such records pass date filtering and cannot be version-assigned
    /// by interval lookup.
    pub published_at: Option<NaiveDateTime>,
    /// App version label; empty string = missing. Only the backfiller
    /// writes to this after construction.
    pub version: String,
    /// 1-based feed page the record was observed on. Diagnostics only.
    pub source_page: u32,
    /// Which storefront produced the record.
    pub platform: String,
}

impl ReviewRecord {
    /// Whether the version label is absent and eligible for backfilling.
    pub fn version_missing(&self) -> bool {
        self.version.trim().is_empty()
    }

    /// Calendar date of publication, when the timestamp parsed.
    pub fn published_date(&self) -> Option<NaiveDate> {
        self.published_at.map(|dt| dt.date())
    }
}

/// One span of the reconstructed release timeline: `version` was current
/// from `start` (inclusive) until `end` (exclusive). The final interval of
/// a timeline is closed at `end`, which is the maximum observed date in
/// the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInterval {
    pub version: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl VersionInterval {
    /// Half-open membership test.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn interval_is_half_open() {
        let interval = VersionInterval {
            version: "2.0".into(),
            start: date(2024, 2, 1),
            end: date(2024, 3, 1),
        };
        assert!(interval.contains(date(2024, 2, 1)));
        assert!(interval.contains(date(2024, 2, 28)));
        assert!(!interval.contains(date(2024, 3, 1)));
        assert!(!interval.contains(date(2024, 1, 31)));
    }

    #[test]
    fn version_missing_treats_whitespace_as_empty() {
        let mut record = ReviewRecord {
            id: String::new(),
            title: String::new(),
            author: String::new(),
            rating: 0,
            content: "fine".into(),
            published_raw: String::new(),
            published_at: None,
            version: "  ".into(),
            source_page: 1,
            platform: "rss".into(),
        };
        assert!(record.version_missing());
        record.version = "1.0".into();
        assert!(!record.version_missing());
    }
}
