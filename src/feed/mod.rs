// src/feed/mod.rs
//! Feed access: HTTP client, page fetcher, outcome classification, and the
//! pagination controller.
//!
//! The fetcher turns one HTTP exchange into exactly one `PageOutcome`; the
//! controller owns every retry and stopping decision. Keeping the two apart
//! means the controller's state machine can be exercised against scripted
//! outcome sequences without a network.

pub mod client;
pub mod controller;
pub mod fetcher;
pub mod parser;

use crate::model::ReviewRecord;
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

pub use client::FeedHttpClient;
pub use controller::{
    CancelToken, DateWindow, FetchController, FetchPolicy, FetchSession, ProgressCallback,
};
pub use fetcher::RssPageFetcher;

/// Closed classification of one page request. The fetcher never retries and
/// never raises for network conditions — it reports what happened and the
/// controller dispatches on it.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// HTTP 200 with a parseable feed body. The records have already been
    /// normalized and stripped of empty-content entries; an empty vector
    /// means the page had entries but none were usable.
    Success(Vec<ReviewRecord>),
    /// HTTP 200 whose entry list (after the page-1 self-entry skip) is empty.
    EmptyPage,
    /// HTTP 200 whose body failed JSON parsing.
    MalformedBody,
    ClientError400,
    ServerError502,
    RateLimited429,
    NotFound404,
    OtherHttp(u16),
    Timeout,
    ConnectionFailure,
}

/// A paginated review source. The production implementation is
/// `RssPageFetcher`; tests substitute scripted sequences.
#[async_trait]
pub trait ReviewFeed: Send + Sync {
    /// Fetches one 1-based page and classifies the result.
    async fn fetch_page(&self, page: u32) -> PageOutcome;
}

/// An inclusive delay interval in seconds, sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayRange {
    min_secs: f64,
    max_secs: f64,
}

impl DelayRange {
    pub fn new(min_secs: f64, max_secs: f64) -> Self {
        Self {
            min_secs: min_secs.max(0.0),
            max_secs: max_secs.max(min_secs).max(0.0),
        }
    }

    /// A range that never sleeps, for tests and timeout handling.
    pub const fn zero() -> Self {
        Self {
            min_secs: 0.0,
            max_secs: 0.0,
        }
    }

    pub fn sample(&self) -> Duration {
        if self.max_secs <= 0.0 {
            return Duration::ZERO;
        }
        let secs = rand::rng().random_range(self.min_secs..=self.max_secs);
        Duration::from_secs_f64(secs)
    }
}

/// Sleeps for a uniformly sampled duration from the range, skipping the
/// timer entirely for zero ranges.
pub(crate) async fn pause(range: &DelayRange) {
    let duration = range.sample();
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_range_orders_bounds() {
        let range = DelayRange::new(5.0, 2.0);
        let sampled = range.sample();
        assert!(sampled >= Duration::from_secs_f64(2.0));
        assert!(sampled <= Duration::from_secs_f64(5.0));
    }

    #[test]
    fn zero_range_never_sleeps() {
        assert_eq!(DelayRange::zero().sample(), Duration::ZERO);
    }
}
