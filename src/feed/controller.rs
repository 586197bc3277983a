// src/feed/controller.rs
//! Bounded pagination state machine over `ReviewFeed` pages.
//!
//! The feed fails in three qualitatively different ways — hard throttling
//! (429), transient server flakiness (502), and request malformation
//! (repeated 400) — each with its own backoff and give-up threshold. A
//! date-filtered scan additionally has to tell "temporarily between matching
//! pages" apart from "past the relevant historical window", which the
//! out-of-range streak approximates without knowing the feed's length.
//!
//! Whatever happens on the wire, `fetch_all` returns the records gathered so
//! far; an empty result and a fully errored run look the same to the caller
//! and are distinguished only through logging and the progress callback.

use crate::constants::{
    MAX_CONSECUTIVE_400_ERRORS, MAX_CONSECUTIVE_ERRORS, MAX_EMPTY_PAGES, MAX_OUT_OF_RANGE_PAGES,
    MAX_SPECIFIC_ERRORS, MIN_PAGES_TO_CHECK, OUT_OF_RANGE_RATIO,
};
use crate::feed::{pause, DelayRange, PageOutcome, ReviewFeed};
use crate::model::ReviewRecord;
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Inclusive date window, expanded to whole days. A record whose timestamp
/// did not parse always passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateWindow {
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
}

impl DateWindow {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self {
            start: start.and_then(|d| d.and_hms_opt(0, 0, 0)),
            end: end.and_then(|d| d.and_hms_opt(23, 59, 59)),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, record: &ReviewRecord) -> bool {
        let Some(published) = record.published_at else {
            return true;
        };
        if let Some(start) = self.start {
            if published < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if published > end {
                return false;
            }
        }
        true
    }
}

/// Stopping thresholds and backoff intervals. The defaults were tuned
/// empirically against the live feed; treat them as knobs, not truths.
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    pub max_consecutive_errors: u32,
    pub max_consecutive_400: u32,
    /// Total 502s (and separately 429s) tolerated over the whole run.
    pub max_specific_errors: u32,
    pub max_out_of_range_pages: u32,
    pub out_of_range_ratio: f64,
    pub min_pages_to_check: u32,
    pub max_empty_pages: u32,
    pub backoff_400: DelayRange,
    pub backoff_502: DelayRange,
    pub backoff_429: DelayRange,
    pub backoff_connection: DelayRange,
    pub backoff_other: DelayRange,
    /// Extra cooldown inserted every tenth page once anything has succeeded.
    pub cooldown: DelayRange,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_consecutive_errors: MAX_CONSECUTIVE_ERRORS,
            max_consecutive_400: MAX_CONSECUTIVE_400_ERRORS,
            max_specific_errors: MAX_SPECIFIC_ERRORS,
            max_out_of_range_pages: MAX_OUT_OF_RANGE_PAGES,
            out_of_range_ratio: OUT_OF_RANGE_RATIO,
            min_pages_to_check: MIN_PAGES_TO_CHECK,
            max_empty_pages: MAX_EMPTY_PAGES,
            backoff_400: DelayRange::new(3.0, 5.0),
            backoff_502: DelayRange::new(3.0, 6.0),
            backoff_429: DelayRange::new(45.0, 75.0),
            backoff_connection: DelayRange::new(5.0, 10.0),
            backoff_other: DelayRange::new(3.0, 7.0),
            cooldown: DelayRange::new(3.0, 6.0),
        }
    }
}

impl FetchPolicy {
    /// A policy with every backoff zeroed, for scripted tests.
    pub fn without_backoff() -> Self {
        Self {
            backoff_400: DelayRange::zero(),
            backoff_502: DelayRange::zero(),
            backoff_429: DelayRange::zero(),
            backoff_connection: DelayRange::zero(),
            backoff_other: DelayRange::zero(),
            cooldown: DelayRange::zero(),
            ..Self::default()
        }
    }
}

/// Transient state of one `fetch_all` run. Created at the start of the call,
/// discarded at the end, never shared across concurrent fetches.
#[derive(Debug, Default)]
pub struct FetchSession {
    pub page: u32,
    pub records: Vec<ReviewRecord>,
    pub consecutive_generic_errors: u32,
    pub consecutive_400_errors: u32,
    pub count_400: u32,
    pub count_502: u32,
    pub count_429: u32,
    pub consecutive_out_of_range_pages: u32,
    pub total_pages_checked: u32,
    pub successful_pages: u32,
    pub empty_page_streak: u32,
    pub found_any_in_range: bool,
}

impl FetchSession {
    fn new() -> Self {
        Self {
            page: 1,
            ..Self::default()
        }
    }
}

/// Invoked once per page with `(current_page, max_pages, records_so_far)`.
/// Purely informational; the return value is not consumed.
pub type ProgressCallback = Box<dyn FnMut(u32, u32, usize) + Send + Sync>;

/// Cooperative cancellation flag, checked between pages (never mid-sleep).
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Drives a `ReviewFeed` across pages, applying the stopping policy and
/// accumulating the final record set.
pub struct FetchController<F: ReviewFeed> {
    feed: F,
    policy: FetchPolicy,
    progress: Option<ProgressCallback>,
    cancel: Option<CancelToken>,
}

impl<F: ReviewFeed> FetchController<F> {
    pub fn new(feed: F) -> Self {
        Self {
            feed,
            policy: FetchPolicy::default(),
            progress: None,
            cancel: None,
        }
    }

    pub fn with_policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Fetches up to `max_pages` pages, keeping records inside `window` and
    /// stopping early per the policy. Returns whatever was accumulated; only
    /// the count of requests is bounded, never raised past the caller.
    pub async fn fetch_all(
        &mut self,
        max_pages: u32,
        window: DateWindow,
        max_records: Option<usize>,
    ) -> Vec<ReviewRecord> {
        let mut session = FetchSession::new();

        while session.page <= max_pages {
            if let Some(token) = &self.cancel {
                if token.is_cancelled() {
                    log::info!("Fetch cancelled at page {}", session.page);
                    break;
                }
            }
            if let Some(max) = max_records {
                if session.records.len() >= max {
                    break;
                }
            }
            if let Some(progress) = &mut self.progress {
                progress(session.page, max_pages, session.records.len());
            }

            session.total_pages_checked += 1;
            let outcome = self.feed.fetch_page(session.page).await;

            let stop = self.handle_outcome(&mut session, outcome, &window, max_records).await;
            if stop {
                break;
            }

            if session.consecutive_generic_errors >= self.policy.max_consecutive_errors {
                log::warn!(
                    "Giving up after {} consecutive errors",
                    session.consecutive_generic_errors
                );
                break;
            }

            if session.page % 10 == 0 && session.successful_pages > 0 {
                pause(&self.policy.cooldown).await;
            }
        }

        if let Some(max) = max_records {
            session.records.truncate(max);
        }

        log::info!(
            "Fetch finished: {} records over {} pages ({} successful)",
            session.records.len(),
            session.total_pages_checked,
            session.successful_pages
        );
        session.records
    }

    /// Applies one outcome to the session. Returns `true` when the run must
    /// stop.
    async fn handle_outcome(
        &self,
        session: &mut FetchSession,
        outcome: PageOutcome,
        window: &DateWindow,
        max_records: Option<usize>,
    ) -> bool {
        let policy = &self.policy;

        match outcome {
            PageOutcome::Success(records) => {
                session.successful_pages += 1;
                session.consecutive_generic_errors = 0;
                session.consecutive_400_errors = 0;

                if records.is_empty() {
                    // Entries existed but none were usable: the feed's real
                    // content has ended
                    return true;
                }
                session.empty_page_streak = 0;

                let total_processed = records.len();
                let mut in_range: Vec<ReviewRecord> =
                    records.into_iter().filter(|r| window.contains(r)).collect();
                let out_of_range = total_processed - in_range.len();

                if !in_range.is_empty() {
                    if let Some(max) = max_records {
                        let remaining = max.saturating_sub(session.records.len());
                        if remaining == 0 {
                            return true;
                        }
                        in_range.truncate(remaining);
                    }
                    session.found_any_in_range = true;
                    session.records.extend(in_range);
                }

                let ratio = out_of_range as f64 / total_processed as f64;
                if ratio >= policy.out_of_range_ratio {
                    session.consecutive_out_of_range_pages += 1;
                } else {
                    session.consecutive_out_of_range_pages = 0;
                }

                if session.consecutive_out_of_range_pages >= policy.max_out_of_range_pages
                    && session.total_pages_checked >= policy.min_pages_to_check
                {
                    log::info!(
                        "Stopping: {} consecutive pages outside the date window",
                        session.consecutive_out_of_range_pages
                    );
                    return true;
                }
                if !session.found_any_in_range
                    && session.total_pages_checked >= policy.min_pages_to_check * 2
                {
                    log::info!("Stopping: no in-range review found in {} pages", session.total_pages_checked);
                    return true;
                }

                session.page += 1;
                false
            }

            PageOutcome::EmptyPage => {
                session.successful_pages += 1;
                session.consecutive_generic_errors = 0;
                session.consecutive_400_errors = 0;
                session.empty_page_streak += 1;
                if session.empty_page_streak >= policy.max_empty_pages {
                    log::info!("Stopping: {} consecutive empty pages", session.empty_page_streak);
                    return true;
                }
                session.page += 1;
                false
            }

            PageOutcome::MalformedBody => {
                // The server answered, so 400-streak tracking resets, but a
                // body we cannot read still counts toward the generic cap
                session.successful_pages += 1;
                session.consecutive_400_errors = 0;
                session.consecutive_generic_errors += 1;
                session.page += 1;
                false
            }

            PageOutcome::ClientError400 => {
                session.count_400 += 1;
                session.consecutive_400_errors += 1;
                session.consecutive_generic_errors += 1;

                if session.consecutive_400_errors >= policy.max_consecutive_400 {
                    return true;
                }
                if session.count_400 <= 3 {
                    session.page += 1;
                } else if session.count_400 <= 6 {
                    pause(&policy.backoff_400).await;
                    session.page += 1;
                } else {
                    return true;
                }
                false
            }

            PageOutcome::ServerError502 => {
                session.count_502 += 1;
                session.consecutive_generic_errors += 1;
                session.consecutive_400_errors = 0;
                pause(&policy.backoff_502).await;
                // Same page is retried after the backoff
                session.count_502 >= policy.max_specific_errors
            }

            PageOutcome::RateLimited429 => {
                session.count_429 += 1;
                session.consecutive_generic_errors += 1;
                session.consecutive_400_errors = 0;
                pause(&policy.backoff_429).await;
                session.count_429 >= policy.max_specific_errors
            }

            PageOutcome::NotFound404 => {
                session.consecutive_400_errors = 0;
                session.consecutive_generic_errors += 1;
                session.page += 1;
                session.consecutive_generic_errors >= 3
            }

            PageOutcome::Timeout => {
                session.consecutive_generic_errors += 1;
                session.consecutive_400_errors = 0;
                session.page += 1;
                false
            }

            PageOutcome::ConnectionFailure => {
                session.consecutive_generic_errors += 1;
                session.consecutive_400_errors = 0;
                session.page += 1;
                pause(&policy.backoff_connection).await;
                false
            }

            PageOutcome::OtherHttp(status) => {
                log::warn!("Unexpected HTTP status {} on page {}", status, session.page);
                session.consecutive_generic_errors += 1;
                session.consecutive_400_errors = 0;
                session.page += 1;
                pause(&policy.backoff_other).await;
                false
            }
        }
    }
}
