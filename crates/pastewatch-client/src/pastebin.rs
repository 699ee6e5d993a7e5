use std::time::Duration;

use pastewatch_core::error::AppError;
use pastewatch_core::models::Paste;
use pastewatch_core::traits::{FeedClient, FetchOutcome};
use reqwest::{Client, StatusCode};
use url::Url;

const DEFAULT_BASE_URL: &str = "https://scrape.pastebin.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest listing the scraping API serves in one call.
pub const MAX_LIST_LIMIT: u32 = 250;

/// Opening of the provider's rate-limit notice, matched case-insensitively.
const THROTTLE_NOTICE_PREFIX: &str = "please slow down";

/// Bodies longer than this are paste content, never a provider notice.
const NOTICE_MAX_LEN: usize = 512;

/// Feed client for the Pastebin scraping API.
///
/// The API only answers whitelisted IPs; anything else gets a plain-text
/// notice instead of JSON, which surfaces as an [`AppError::HttpError`].
#[derive(Clone)]
pub struct PastebinClient {
    client: Client,
    base_url: Url,
    list_limit: u32,
    timeout_secs: u64,
}

impl PastebinClient {
    pub fn new() -> Result<Self, AppError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, AppError> {
        Self::build(base_url, DEFAULT_TIMEOUT, MAX_LIST_LIMIT)
    }

    pub fn with_timeout(self, timeout: Duration) -> Result<Self, AppError> {
        Self::build(self.base_url.as_str(), timeout, self.list_limit)
    }

    /// Number of pastes requested per listing, clamped to `1..=250`.
    pub fn with_list_limit(mut self, limit: u32) -> Self {
        self.list_limit = limit.clamp(1, MAX_LIST_LIMIT);
        self
    }

    fn build(base_url: &str, timeout: Duration, list_limit: u32) -> Result<Self, AppError> {
        // A trailing slash makes `join` append instead of replacing the last segment.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|e| AppError::ConfigError(format!("Invalid feed URL '{base_url}': {e}")))?;

        let client = Client::builder()
            .user_agent("pastewatch/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            list_limit,
            timeout_secs: timeout.as_secs(),
        })
    }

    fn endpoint(&self, path: &str, param: (&str, &str)) -> Result<Url, AppError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| AppError::HttpError(format!("Invalid endpoint {path}: {e}")))?;
        url.query_pairs_mut().append_pair(param.0, param.1);
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<(StatusCode, String), AppError> {
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else {
                AppError::HttpError(e.to_string())
            }
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to read response body: {e}")))?;
        Ok((status, decode_body(bytes.to_vec(), &url)))
    }
}

impl FeedClient for PastebinClient {
    async fn list_latest(&self) -> Result<Vec<Paste>, AppError> {
        let url = self.endpoint("api_scraping.php", ("limit", &self.list_limit.to_string()))?;
        let (status, body) = self.get(url).await?;
        let pastes = parse_listing(status, &body)?;
        tracing::debug!(count = pastes.len(), "Fetched listing");
        Ok(pastes)
    }

    async fn fetch_content(&self, key: &str) -> Result<FetchOutcome, AppError> {
        let url = self.endpoint("api_scrape_item.php", ("i", key))?;
        let (status, body) = self.get(url).await?;
        classify_item(status, body, key)
    }
}

fn parse_listing(status: StatusCode, body: &str) -> Result<Vec<Paste>, AppError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(AppError::RateLimitExceeded);
    }
    if !status.is_success() {
        return Err(AppError::HttpError(format!(
            "HTTP {} listing pastes",
            status.as_u16()
        )));
    }
    if !body.trim_start().starts_with('[') {
        return Err(AppError::HttpError(format!(
            "Unexpected listing response: {}",
            snippet(body)
        )));
    }
    Ok(serde_json::from_str(body)?)
}

fn classify_item(status: StatusCode, body: String, key: &str) -> Result<FetchOutcome, AppError> {
    if status == StatusCode::TOO_MANY_REQUESTS || is_throttle_notice(&body) {
        return Ok(FetchOutcome::Throttled);
    }
    if !status.is_success() {
        return Err(AppError::HttpError(format!(
            "HTTP {} for paste {key}",
            status.as_u16()
        )));
    }
    Ok(FetchOutcome::Content(body))
}

fn is_throttle_notice(body: &str) -> bool {
    if body.len() > NOTICE_MAX_LEN {
        return false;
    }
    body.trim_start()
        .get(..THROTTLE_NOTICE_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(THROTTLE_NOTICE_PREFIX))
}

/// Pastes are stored as text; invalid UTF-8 is replaced rather than rejected.
fn decode_body(bytes: Vec<u8>, url: &Url) -> String {
    match String::from_utf8(bytes) {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(
                url = %url,
                valid_up_to = e.utf8_error().valid_up_to(),
                "Response body is not valid UTF-8, replacing invalid sequences"
            );
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

fn snippet(body: &str) -> String {
    body.trim().chars().take(120).collect()
}
