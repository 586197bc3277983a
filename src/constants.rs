// src/constants.rs
//! Domain constants that define the operational boundaries of the fetch run.
//!
//! Each constant is named for the domain concept it constrains. The stopping
//! thresholds were tuned empirically against the live feed; they are exposed
//! as `FetchPolicy` defaults rather than hard-wired so callers can adjust
//! them per storefront.

// ---------------------------------------------------------------------------
// Feed boundaries
// ---------------------------------------------------------------------------

/// Request timeout for one feed page.
pub const FEED_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Reviews the feed typically returns per page, used to shrink the page
/// budget when a review limit is set.
pub const REVIEWS_PER_PAGE_ESTIMATE: usize = 15;

/// Extra pages added on top of the estimated budget as a safety margin.
pub const PAGE_BUDGET_MARGIN: u32 = 5;

// ---------------------------------------------------------------------------
// Stopping thresholds (FetchPolicy defaults)
// ---------------------------------------------------------------------------

/// Consecutive failures of any class before the run is abandoned.
pub const MAX_CONSECUTIVE_ERRORS: u32 = 10;

/// Consecutive HTTP 400 responses before the run is abandoned.
pub const MAX_CONSECUTIVE_400_ERRORS: u32 = 5;

/// Total 502 or 429 responses tolerated before giving up on the feed.
pub const MAX_SPECIFIC_ERRORS: u32 = 8;

/// Consecutive pages dominated by out-of-range reviews before the date
/// window is considered exhausted.
pub const MAX_OUT_OF_RANGE_PAGES: u32 = 15;

/// Fraction of a page's reviews that must fall outside the date window for
/// the page to count toward the out-of-range streak.
pub const OUT_OF_RANGE_RATIO: f64 = 0.9;

/// Pages that must be sampled before the out-of-range streak is trusted.
pub const MIN_PAGES_TO_CHECK: u32 = 10;

/// Consecutive entry-less pages before the feed is considered drained.
pub const MAX_EMPTY_PAGES: u32 = 3;

// ---------------------------------------------------------------------------
// Version inference
// ---------------------------------------------------------------------------

/// Label assigned when no valid version progression exists to infer from.
pub const UNKNOWN_VERSION: &str = "Unknown";

/// Platform tag stamped on every record produced by the RSS fetcher.
pub const PLATFORM_RSS: &str = "rss";
