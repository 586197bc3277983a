//! Fetch-controller scenarios driven by a scripted feed.
//!
//! The scripts replay outcome sequences the live feed produces — productive
//! pages, drained pages, throttling, flaky gateways — and assert the
//! controller's stopping behavior and result invariants.

use async_trait::async_trait;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use reviews2csv::{
    CancelToken, DateWindow, FetchController, FetchPolicy, PageOutcome, ReviewFeed, ReviewRecord,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Replays a fixed outcome sequence, one per `fetch_page` call, recording
/// the pages requested. Runs out of script → drained feed.
struct ScriptedFeed {
    script: Mutex<VecDeque<PageOutcome>>,
    calls: AtomicU32,
    pages_seen: Mutex<Vec<u32>>,
}

impl ScriptedFeed {
    fn new(outcomes: Vec<PageOutcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            calls: AtomicU32::new(0),
            pages_seen: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReviewFeed for &ScriptedFeed {
    async fn fetch_page(&self, page: u32) -> PageOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages_seen.lock().unwrap().push(page);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(PageOutcome::EmptyPage)
    }
}

fn record(page: u32, seq: u32, date: &str) -> ReviewRecord {
    ReviewRecord {
        id: format!("p{}-{}", page, seq),
        title: String::new(),
        author: format!("author-{}", seq),
        rating: 1 + (seq % 5) as u8,
        content: format!("review {} on page {}", seq, page),
        published_raw: date.to_string(),
        published_at: NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(12, 0, 0)),
        version: String::new(),
        source_page: page,
        platform: "rss".into(),
    }
}

fn page_of(page: u32, count: u32, date: &str) -> PageOutcome {
    PageOutcome::Success((0..count).map(|seq| record(page, seq, date)).collect())
}

fn controller(feed: &ScriptedFeed) -> FetchController<&ScriptedFeed> {
    FetchController::new(feed).with_policy(FetchPolicy::without_backoff())
}

fn window(start: &str, end: &str) -> DateWindow {
    DateWindow::new(
        NaiveDate::parse_from_str(start, "%Y-%m-%d").ok(),
        NaiveDate::parse_from_str(end, "%Y-%m-%d").ok(),
    )
}

#[tokio::test]
async fn basic_pagination_stops_at_first_drained_page() {
    let feed = ScriptedFeed::new(vec![
        page_of(1, 10, "2024-03-01"),
        page_of(2, 10, "2024-03-02"),
        page_of(3, 10, "2024-03-03"),
        // Page 4: entries exist but none usable — the feed's content ended
        PageOutcome::Success(Vec::new()),
    ]);

    let records = controller(&feed)
        .fetch_all(5, DateWindow::default(), None)
        .await;

    assert_eq!(records.len(), 30);
    let pages: Vec<u32> = records.iter().map(|r| r.source_page).collect();
    assert!(pages.iter().all(|&p| (1..=3).contains(&p)));
    // Stops at page 4 without consuming the full page budget
    assert_eq!(feed.calls(), 4);
    assert_eq!(*feed.pages_seen.lock().unwrap(), vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn rate_limit_abort_returns_partial_results_without_raising() {
    let mut script = vec![page_of(1, 4, "2024-03-01")];
    script.extend(vec![PageOutcome::RateLimited429; 20]);
    let feed = ScriptedFeed::new(script);

    let records = controller(&feed)
        .fetch_all(50, DateWindow::default(), None)
        .await;

    // Gives up after the 8th 429; keeps what was collected before
    assert_eq!(records.len(), 4);
    assert_eq!(feed.calls(), 1 + 8);
}

#[tokio::test]
async fn rate_limit_abort_with_nothing_collected_yields_empty_list() {
    let feed = ScriptedFeed::new(vec![PageOutcome::RateLimited429; 20]);

    let records = controller(&feed)
        .fetch_all(50, DateWindow::default(), None)
        .await;

    assert!(records.is_empty());
    assert_eq!(feed.calls(), 8);
    // The throttled page is retried, never skipped
    assert_eq!(*feed.pages_seen.lock().unwrap(), vec![1; 8]);
}

#[tokio::test]
async fn never_issues_more_requests_than_max_pages() {
    let script: Vec<PageOutcome> = (1..=100)
        .map(|page| page_of(page, 10, "2024-03-01"))
        .collect();
    let feed = ScriptedFeed::new(script);

    let records = controller(&feed)
        .fetch_all(3, DateWindow::default(), None)
        .await;

    assert_eq!(feed.calls(), 3);
    assert_eq!(records.len(), 30);
}

#[tokio::test]
async fn max_records_truncates_and_stops_early() {
    let script: Vec<PageOutcome> = (1..=10)
        .map(|page| page_of(page, 10, "2024-03-01"))
        .collect();
    let feed = ScriptedFeed::new(script);

    let records = controller(&feed)
        .fetch_all(10, DateWindow::default(), Some(12))
        .await;

    assert_eq!(records.len(), 12);
    // Page 1 gives 10, page 2 tops up to 12; page 3 is never requested
    assert_eq!(feed.calls(), 2);
}

#[tokio::test]
async fn date_window_filters_records_and_unparseable_dates_pass() {
    let mut undated = record(1, 99, "not-a-date");
    undated.published_at = None;
    let feed = ScriptedFeed::new(vec![
        PageOutcome::Success(vec![
            record(1, 0, "2024-02-10"),
            record(1, 1, "2023-12-25"),
            record(1, 2, "2024-02-28"),
            record(1, 3, "2024-05-01"),
            undated,
        ]),
        PageOutcome::Success(Vec::new()),
    ]);

    let records = controller(&feed)
        .fetch_all(5, window("2024-02-01", "2024-02-28"), None)
        .await;

    assert_eq!(records.len(), 3);
    for r in &records {
        if let Some(published) = r.published_at {
            let date = published.date();
            assert!(date >= NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
            assert!(date <= NaiveDate::from_ymd_opt(2024, 2, 28).unwrap());
        }
    }
    // The record that never parsed is retained
    assert!(records.iter().any(|r| r.published_at.is_none()));
}

#[tokio::test]
async fn out_of_range_streak_ends_a_dated_scan() {
    // Page 1 is productive, then every page predates the window
    let mut script = vec![page_of(1, 10, "2024-02-10")];
    script.extend((2..=40).map(|page| page_of(page, 10, "2023-01-01")));
    let feed = ScriptedFeed::new(script);

    let records = controller(&feed)
        .fetch_all(40, window("2024-02-01", "2024-02-28"), None)
        .await;

    assert_eq!(records.len(), 10);
    // 15 consecutive out-of-range pages after the productive first one
    assert_eq!(feed.calls(), 1 + 15);
}

#[tokio::test]
async fn scan_that_never_matches_stops_on_the_streak_rule() {
    let script: Vec<PageOutcome> = (1..=40)
        .map(|page| page_of(page, 10, "2020-01-01"))
        .collect();
    let feed = ScriptedFeed::new(script);

    let records = controller(&feed)
        .fetch_all(40, window("2024-02-01", "2024-02-28"), None)
        .await;

    assert!(records.is_empty());
    // Every page is wholly out of range, so the streak threshold (15)
    // is reached with enough pages sampled to trust it
    assert_eq!(feed.calls(), 15);
}

#[tokio::test]
async fn flaky_scan_that_never_matches_gives_up_after_twenty_pages() {
    // Timeouts interleave with out-of-range pages, so the streak grows too
    // slowly to fire; the never-found-anything rule caps the scan instead
    let mut script = Vec::new();
    for page in 1..=20 {
        script.push(PageOutcome::Timeout);
        script.push(page_of(page, 10, "2020-01-01"));
    }
    let feed = ScriptedFeed::new(script);

    let records = controller(&feed)
        .fetch_all(40, window("2024-02-01", "2024-02-28"), None)
        .await;

    assert!(records.is_empty());
    assert_eq!(feed.calls(), 20);
}

#[tokio::test]
async fn consecutive_bad_requests_abandon_the_run() {
    let feed = ScriptedFeed::new(vec![PageOutcome::ClientError400; 20]);

    let records = controller(&feed)
        .fetch_all(50, DateWindow::default(), None)
        .await;

    assert!(records.is_empty());
    assert_eq!(feed.calls(), 5);
}

#[tokio::test]
async fn flaky_gateway_is_retried_then_abandoned() {
    let feed = ScriptedFeed::new(vec![PageOutcome::ServerError502; 20]);

    let records = controller(&feed)
        .fetch_all(50, DateWindow::default(), None)
        .await;

    assert!(records.is_empty());
    assert_eq!(feed.calls(), 8);
    assert_eq!(*feed.pages_seen.lock().unwrap(), vec![1; 8]);
}

#[tokio::test]
async fn generic_error_cap_bounds_mixed_failures() {
    let feed = ScriptedFeed::new(vec![PageOutcome::Timeout; 30]);

    let records = controller(&feed)
        .fetch_all(50, DateWindow::default(), None)
        .await;

    assert!(records.is_empty());
    assert_eq!(feed.calls(), 10);
}

#[tokio::test]
async fn missing_pages_stop_after_three_consecutive_misses() {
    let feed = ScriptedFeed::new(vec![PageOutcome::NotFound404; 10]);

    let records = controller(&feed)
        .fetch_all(50, DateWindow::default(), None)
        .await;

    assert!(records.is_empty());
    assert_eq!(feed.calls(), 3);
}

#[tokio::test]
async fn empty_page_streak_drains_the_feed() {
    let feed = ScriptedFeed::new(vec![
        page_of(1, 5, "2024-03-01"),
        PageOutcome::EmptyPage,
        PageOutcome::EmptyPage,
        PageOutcome::EmptyPage,
        page_of(5, 5, "2024-03-01"),
    ]);

    let records = controller(&feed)
        .fetch_all(50, DateWindow::default(), None)
        .await;

    assert_eq!(records.len(), 5);
    assert_eq!(feed.calls(), 4);
}

#[tokio::test]
async fn a_productive_page_resets_the_empty_streak() {
    let feed = ScriptedFeed::new(vec![
        PageOutcome::EmptyPage,
        PageOutcome::EmptyPage,
        page_of(3, 5, "2024-03-01"),
        PageOutcome::EmptyPage,
        PageOutcome::EmptyPage,
        PageOutcome::EmptyPage,
    ]);

    let records = controller(&feed)
        .fetch_all(50, DateWindow::default(), None)
        .await;

    assert_eq!(records.len(), 5);
    assert_eq!(feed.calls(), 6);
}

#[tokio::test]
async fn cancellation_stops_the_run_between_pages() {
    let script: Vec<PageOutcome> = (1..=30)
        .map(|page| page_of(page, 10, "2024-03-01"))
        .collect();
    let feed = ScriptedFeed::new(script);

    let token = CancelToken::new();
    let observer = token.clone();
    let mut controller = FetchController::new(&feed)
        .with_policy(FetchPolicy::without_backoff())
        .with_cancel(token)
        .with_progress(Box::new(move |page, _, _| {
            if page == 3 {
                observer.cancel();
            }
        }));

    let records = controller.fetch_all(30, DateWindow::default(), None).await;

    // Page 3's request was already committed when the flag flipped;
    // page 4 is never issued
    assert_eq!(feed.calls(), 3);
    assert_eq!(records.len(), 30);
}

#[tokio::test]
async fn progress_callback_reports_every_page() {
    let feed = ScriptedFeed::new(vec![
        page_of(1, 2, "2024-03-01"),
        page_of(2, 2, "2024-03-01"),
        PageOutcome::Success(Vec::new()),
    ]);

    let seen = std::sync::Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let mut controller = FetchController::new(&feed)
        .with_policy(FetchPolicy::without_backoff())
        .with_progress(Box::new(move |page, max_pages, collected| {
            sink.lock().unwrap().push((page, max_pages, collected));
        }));

    controller.fetch_all(10, DateWindow::default(), None).await;

    assert_eq!(
        *seen.lock().unwrap(),
        vec![(1, 10, 0), (2, 10, 2), (3, 10, 4)]
    );
}

#[tokio::test]
async fn malformed_bodies_advance_but_eventually_exhaust_the_error_cap() {
    let feed = ScriptedFeed::new(vec![PageOutcome::MalformedBody; 30]);

    let records = controller(&feed)
        .fetch_all(50, DateWindow::default(), None)
        .await;

    assert!(records.is_empty());
    assert_eq!(feed.calls(), 10);
}

#[tokio::test]
async fn no_returned_record_has_empty_content() {
    let feed = ScriptedFeed::new(vec![
        page_of(1, 10, "2024-03-01"),
        page_of(2, 10, "2024-03-02"),
        PageOutcome::Success(Vec::new()),
    ]);

    let records = controller(&feed)
        .fetch_all(10, DateWindow::default(), None)
        .await;

    assert!(!records.is_empty());
    assert!(records.iter().all(|r| !r.content.trim().is_empty()));
    assert!(records.iter().all(|r| r.rating <= 5));
}
