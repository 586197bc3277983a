// src/feed/fetcher.rs
//! One HTTP request per feed page, classified into a `PageOutcome`.
//!
//! The fetcher owns the politeness throttle: every request is preceded by a
//! uniformly sampled delay so page scans never hammer the storefront at
//! connection speed. Retry policy is entirely the controller's concern.

use crate::feed::parser::{extract_entries, normalize_entry};
use crate::feed::{pause, DelayRange, FeedHttpClient, PageOutcome, ReviewFeed};
use async_trait::async_trait;
use reqwest::StatusCode;

/// Fetches review pages for one app from one storefront region.
pub struct RssPageFetcher {
    client: FeedHttpClient,
    app_id: u64,
    region: String,
    delay: DelayRange,
}

impl RssPageFetcher {
    pub fn new(client: FeedHttpClient, app_id: u64, region: impl Into<String>, delay: DelayRange) -> Self {
        Self {
            client,
            app_id,
            region: region.into(),
            delay,
        }
    }

    /// Deterministic page URL from the fixed feed template.
    fn page_url(&self, page: u32) -> String {
        format!(
            "https://itunes.apple.com/{}/rss/customerreviews/page={}/id={}/sortby=mostrecent/json",
            self.region, page, self.app_id
        )
    }

    fn classify_body(&self, body: &str, page: u32) -> PageOutcome {
        let Some(entries) = extract_entries(body, page) else {
            return PageOutcome::MalformedBody;
        };
        if entries.is_empty() {
            return PageOutcome::EmptyPage;
        }

        let records = entries
            .iter()
            .filter_map(|entry| normalize_entry(entry, page))
            .collect();
        PageOutcome::Success(records)
    }
}

#[async_trait]
impl ReviewFeed for RssPageFetcher {
    async fn fetch_page(&self, page: u32) -> PageOutcome {
        debug_assert!(page >= 1, "feed pages are 1-based");

        // Politeness throttle before every request
        pause(&self.delay).await;

        let url = self.page_url(page);
        let response = match self.client.get(&url).await {
            Ok(response) => response,
            Err(err) if err.is_timeout() => {
                log::warn!("Page {} timed out", page);
                return PageOutcome::Timeout;
            }
            Err(err) => {
                log::warn!("Page {} connection failure: {}", page, err);
                return PageOutcome::ConnectionFailure;
            }
        };

        match response.status() {
            StatusCode::OK => match response.text().await {
                Ok(body) => self.classify_body(&body, page),
                Err(_) => PageOutcome::ConnectionFailure,
            },
            StatusCode::BAD_REQUEST => PageOutcome::ClientError400,
            StatusCode::BAD_GATEWAY => PageOutcome::ServerError502,
            StatusCode::TOO_MANY_REQUESTS => PageOutcome::RateLimited429,
            StatusCode::NOT_FOUND => PageOutcome::NotFound404,
            other => PageOutcome::OtherHttp(other.as_u16()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fetcher() -> RssPageFetcher {
        RssPageFetcher::new(
            FeedHttpClient::new().expect("client"),
            1360892562,
            "tr",
            DelayRange::zero(),
        )
    }

    #[test]
    fn url_follows_the_fixed_template() {
        assert_eq!(
            fetcher().page_url(7),
            "https://itunes.apple.com/tr/rss/customerreviews/page=7/id=1360892562/sortby=mostrecent/json"
        );
    }

    #[test]
    fn body_classification_separates_the_three_success_shapes() {
        let f = fetcher();

        assert_eq!(f.classify_body("not json", 2), PageOutcome::MalformedBody);
        assert_eq!(
            f.classify_body(r#"{"feed":{}}"#, 2),
            PageOutcome::EmptyPage
        );

        let body = serde_json::json!({"feed": {"entry": [
            {"content": {"label": "usable"}},
            {"content": {"label": ""}},
        ]}})
        .to_string();
        match f.classify_body(&body, 2) {
            PageOutcome::Success(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].content, "usable");
            }
            other => panic!("expected Success, got {:?}", other),
        }
    }
}
