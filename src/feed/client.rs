// src/feed/client.rs
//! Pure HTTP client wrapper for the storefront RSS feed.
//!
//! A thin wrapper around reqwest that carries the browser-like headers and
//! timeout every feed request shares. No parsing or classification happens
//! here.

use crate::constants::FEED_REQUEST_TIMEOUT_SECS;
use crate::error::AppError;
use reqwest::{header, Client, Response};
use std::time::Duration;

const FEED_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// A thin wrapper around reqwest Client for feed page requests.
#[derive(Clone)]
pub struct FeedHttpClient {
    client: Client,
}

impl FeedHttpClient {
    /// Creates a client with the shared feed headers and request timeout.
    pub fn new() -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers())
            .timeout(Duration::from_secs(FEED_REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }

    /// Headers the feed serves most reliably under. The storefront rejects
    /// obviously non-browser user agents with elevated 403/429 rates.
    fn create_headers() -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::USER_AGENT, header::HeaderValue::from_static(FEED_USER_AGENT));
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            header::HeaderValue::from_static("en-US,en;q=0.9"),
        );
        headers.insert(
            header::CACHE_CONTROL,
            header::HeaderValue::from_static("no-cache"),
        );
        headers
    }

    /// Issues a GET for the given feed URL.
    pub async fn get(&self, url: &str) -> Result<Response, reqwest::Error> {
        log::debug!("GET {}", url);
        self.client.get(url).send().await
    }
}
