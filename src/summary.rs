// src/summary.rs
//! Post-run dataset measurements for user-facing reporting.

use crate::model::ReviewRecord;
use chrono::NaiveDateTime;
use std::collections::HashSet;

/// Aggregate statistics over one harvested dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetSummary {
    pub total_reviews: usize,
    /// Mean over ratings > 0 (0 means the rating was unknown).
    pub average_rating: Option<f64>,
    pub unique_authors: usize,
    /// First and last feed page that contributed records.
    pub page_span: Option<(u32, u32)>,
    pub oldest: Option<NaiveDateTime>,
    pub newest: Option<NaiveDateTime>,
}

impl DatasetSummary {
    pub fn measure(records: &[ReviewRecord]) -> Self {
        let rated: Vec<u8> = records
            .iter()
            .map(|r| r.rating)
            .filter(|&r| r > 0)
            .collect();
        let average_rating = if rated.is_empty() {
            None
        } else {
            Some(rated.iter().map(|&r| r as f64).sum::<f64>() / rated.len() as f64)
        };

        let unique_authors = records
            .iter()
            .filter(|r| !r.author.is_empty())
            .map(|r| r.author.as_str())
            .collect::<HashSet<_>>()
            .len();

        let pages: Vec<u32> = records.iter().map(|r| r.source_page).collect();
        let page_span = match (pages.iter().min(), pages.iter().max()) {
            (Some(&min), Some(&max)) => Some((min, max)),
            _ => None,
        };

        let dates: Vec<NaiveDateTime> = records.iter().filter_map(|r| r.published_at).collect();

        Self {
            total_reviews: records.len(),
            average_rating,
            unique_authors,
            page_span,
            oldest: dates.iter().min().copied(),
            newest: dates.iter().max().copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(author: &str, rating: u8, page: u32, date: &str) -> ReviewRecord {
        ReviewRecord {
            id: String::new(),
            title: String::new(),
            author: author.into(),
            rating,
            content: "text".into(),
            published_raw: date.to_string(),
            published_at: chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(8, 0, 0)),
            version: "1.0".into(),
            source_page: page,
            platform: "rss".into(),
        }
    }

    #[test]
    fn measures_ratings_authors_pages_and_dates() {
        let records = vec![
            record("alice", 5, 1, "2024-01-01"),
            record("bob", 3, 2, "2024-03-01"),
            record("alice", 0, 4, "bad-date"),
        ];
        let summary = DatasetSummary::measure(&records);

        assert_eq!(summary.total_reviews, 3);
        // Zero ratings are excluded from the mean
        assert_eq!(summary.average_rating, Some(4.0));
        assert_eq!(summary.unique_authors, 2);
        assert_eq!(summary.page_span, Some((1, 4)));
        assert_eq!(
            summary.oldest.unwrap().date(),
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert_eq!(
            summary.newest.unwrap().date(),
            chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }

    #[test]
    fn empty_dataset_measures_to_defaults() {
        let summary = DatasetSummary::measure(&[]);
        assert_eq!(summary, DatasetSummary::default());
    }
}
