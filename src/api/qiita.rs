use chrono::NaiveDate;
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::types::{Article, ErrorDto, ItemDto};
use crate::feed::{FeedQuery, SearchSort};

pub const DEFAULT_BASE_URL: &str = "https://qiita.com";

const OFFICIAL_HOST: &str = "qiita.com";
const MAX_RESPONSE_SIZE: usize = 5 * 1024 * 1024; // 5MB
const MAX_PER_PAGE: u32 = 100;

/// Stock count a "popular" search requires.
pub const POPULAR_MIN_STOCKS: u32 = 10;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Qiita API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Rate limit exceeded, try again later")]
    RateLimited,
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid UTF-8 in response")]
    InvalidUtf8,
    #[error("Unexpected response format: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("Insecure base URL: HTTPS required (except localhost for testing)")]
    InsecureBaseUrl,
    #[error("Fetch task panicked: {0}")]
    TaskPanicked(String),
}

/// Anything that can return one page of articles for a query.
///
/// The feed view model only talks to this trait, which keeps the Qiita
/// HTTP client swappable for scripted sources in tests.
pub trait ArticleSource: Send + Sync + 'static {
    /// Fetch page `page` (1-based) of `query`.
    fn fetch(
        &self,
        query: &FeedQuery,
        page: u32,
    ) -> impl Future<Output = Result<Vec<Article>, ApiError>> + Send;
}

/// Build the `query` parameter of `/api/v2/items` for a feed query.
///
/// `today` is passed in so period filters are reproducible.
pub fn search_query(query: &FeedQuery, today: NaiveDate) -> String {
    let mut parts = Vec::with_capacity(3);

    if !query.tag.is_empty() {
        parts.push(format!("tag:{}", query.tag));
    }
    if query.sort == SearchSort::Popular {
        parts.push(format!("stocks:>={}", POPULAR_MIN_STOCKS));
    }
    if let Some(days) = query.period.days() {
        let since = today - chrono::Duration::days(days);
        parts.push(format!("created:>={}", since.format("%Y-%m-%d")));
    }

    parts.join(" ")
}

/// HTTP client for the Qiita v2 items endpoint.
pub struct QiitaClient {
    client: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
    per_page: u32,
    timeout: Duration,
}

impl std::fmt::Debug for QiitaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QiitaClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("per_page", &self.per_page)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl QiitaClient {
    /// Create a client for `base_url`.
    ///
    /// HTTPS is required unless the host is localhost (mock servers in tests).
    /// `per_page` is clamped to the API's 1..=100 range.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidBaseUrl` if `base_url` does not parse, and
    /// `ApiError::InsecureBaseUrl` for plain HTTP to anything but localhost.
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        token: Option<SecretString>,
        per_page: u32,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        if base_url.scheme() != "https" {
            let is_localhost = matches!(base_url.host_str(), Some("127.0.0.1" | "localhost"));
            if base_url.scheme() != "http" || !is_localhost {
                tracing::error!(base_url = %base_url, "Rejecting non-HTTPS base URL");
                return Err(ApiError::InsecureBaseUrl);
            }
            tracing::warn!(base_url = %base_url, "Using non-HTTPS Qiita base URL (localhost only)");
        }

        Ok(Self {
            client,
            base_url,
            token,
            per_page: per_page.clamp(1, MAX_PER_PAGE),
            timeout,
        })
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    fn items_url(&self, query: &FeedQuery, page: u32) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join("api/v2/items")
            .map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))?;

        let q = search_query(query, chrono::Utc::now().date_naive());
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("page", &page.to_string())
                .append_pair("per_page", &self.per_page.to_string());
            if !q.is_empty() {
                pairs.append_pair("query", &q);
            }
        }
        Ok(url)
    }

    async fn fetch_page(&self, query: &FeedQuery, page: u32) -> Result<Vec<Article>, ApiError> {
        let url = self.items_url(query, page)?;
        let mut request = self.client.get(url.clone()).header("Accept", "application/json");

        // Only the real Qiita host ever sees the token
        if let Some(token) = &self.token {
            if url.host_str() == Some(OFFICIAL_HOST) {
                request = request.header("Authorization", format!("Bearer {}", token.expose_secret()));
            } else {
                tracing::debug!("Skipping access token for non-official base URL");
            }
        }

        tracing::debug!(url = %url, page, "Fetching Qiita items");

        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| ApiError::Timeout(self.timeout.as_secs()))?
            .map_err(ApiError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_for_status(status.as_u16(), response).await);
        }

        let body = read_limited_text(response, MAX_RESPONSE_SIZE).await?;
        let items: Vec<ItemDto> = serde_json::from_str(&body)?;
        let articles: Vec<Article> = items.into_iter().map(ItemDto::into_article).collect();

        tracing::debug!(page, count = articles.len(), "Fetched Qiita items");
        Ok(articles)
    }
}

impl ArticleSource for QiitaClient {
    fn fetch(
        &self,
        query: &FeedQuery,
        page: u32,
    ) -> impl Future<Output = Result<Vec<Article>, ApiError>> + Send {
        self.fetch_page(query, page)
    }
}

/// Map a non-2xx response to an error, using the API's JSON message if any.
async fn error_for_status(status: u16, response: reqwest::Response) -> ApiError {
    let body = read_limited_text(response, 64 * 1024).await.unwrap_or_default();

    match serde_json::from_str::<ErrorDto>(&body) {
        Ok(err) if err.kind.as_deref() == Some("rate_limit_exceeded") => ApiError::RateLimited,
        Ok(err) => ApiError::Api {
            status,
            message: err.message,
        },
        Err(_) if status == 429 => ApiError::RateLimited,
        Err(_) => ApiError::HttpStatus(status),
    }
}

async fn read_limited_text(response: reqwest::Response, limit: usize) -> Result<String, ApiError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ApiError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    String::from_utf8(bytes).map_err(|_| ApiError::InvalidUtf8)
}
