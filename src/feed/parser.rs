// src/feed/parser.rs
//! Defensive extraction of review records from the feed's JSON shape.
//!
//! Every field of interest nests one level as `{field: {"label": value}}`,
//! except `author`, which nests two (`author.name.label`). The feed deviates
//! from this shape often enough that extraction degrades to empty string or
//! zero instead of failing a page.

use crate::constants::PLATFORM_RSS;
use crate::model::ReviewRecord;
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Strips a trailing UTC offset ("-07:00") so the format ladder below only
/// has to deal with naive timestamps.
static UTC_OFFSET_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[+-]\d{2}:\d{2}$").expect("static regex"));

/// Pulls the raw entry array out of a feed body, skipping the feed's
/// self-referential first entry on page 1. Returns `None` when the body is
/// not JSON at all; a parseable body without a `feed.entry` array yields an
/// empty slice (the feed reports drained pages that way).
pub fn extract_entries(body: &str, page: u32) -> Option<Vec<Value>> {
    let data: Value = serde_json::from_str(body).ok()?;

    let entries = match data.get("feed").and_then(|feed| feed.get("entry")) {
        Some(Value::Array(entries)) => entries.clone(),
        // A single remaining entry arrives as an object, not a one-element array
        Some(entry @ Value::Object(_)) => vec![entry.clone()],
        _ => Vec::new(),
    };

    let skip = if page == 1 { 1 } else { 0 };
    Some(entries.into_iter().skip(skip).collect())
}

/// Folds one raw entry into a `ReviewRecord`. Returns `None` when the entry
/// has no usable text content, which disqualifies it from the dataset.
pub fn normalize_entry(entry: &Value, page: u32) -> Option<ReviewRecord> {
    let content = label_of(entry, "content");
    if content.trim().is_empty() {
        return None;
    }

    let published_raw = label_of(entry, "updated");
    let published_at = parse_feed_date(&published_raw);

    Some(ReviewRecord {
        id: label_of(entry, "id"),
        title: label_of(entry, "title"),
        author: author_of(entry),
        rating: rating_of(entry),
        content,
        published_raw,
        published_at,
        version: label_of(entry, "im:version"),
        source_page: page,
        platform: PLATFORM_RSS.to_string(),
    })
}

/// `entry[key]["label"]` with fallbacks: a bare string passes through, and
/// anything else degrades to empty.
fn label_of(entry: &Value, key: &str) -> String {
    match entry.get(key) {
        Some(Value::Object(map)) => map
            .get("label")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

/// `entry.author.name.label`, two levels deep.
fn author_of(entry: &Value) -> String {
    match entry.get("author") {
        Some(author @ Value::Object(_)) => label_of(author, "name"),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

/// Rating from `im:rating.label`, accepted only when purely numeric and
/// within the 0–5 star scale; anything else means unknown.
fn rating_of(entry: &Value) -> u8 {
    let raw = label_of(entry, "im:rating");
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return 0;
    }
    match raw.parse::<u8>() {
        Ok(rating) if rating <= 5 => rating,
        _ => 0,
    }
}

/// Parses the feed's timestamp formats into a naive datetime.
///
/// The feed's native shape is `2024-01-15T10:30:45-07:00`; the offset and
/// any fractional seconds are discarded rather than converted, matching how
/// the date filter treats bounds as local calendar dates. A short ladder of
/// fallback formats covers re-imported datasets.
pub fn parse_feed_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if raw.contains('T') {
        let clean = UTC_OFFSET_SUFFIX.replace(raw, "");
        let clean = clean.split('.').next().unwrap_or(&clean);
        if let Ok(dt) = NaiveDateTime::parse_from_str(clean, "%Y-%m-%dT%H:%M:%S") {
            return Some(dt);
        }
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }

    for fmt in ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    log::debug!("Unparseable feed timestamp: {}", raw);
    None
}
