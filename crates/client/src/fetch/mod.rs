//! HTTP fetch pipeline for the cache service and the provider.
//!
//! ### Requests
//! - One shared `reqwest` client with User-Agent, timeout and redirect limit.
//! - Optional bearer token per request (cache service only).
//! - Max body bytes: 5MB (configurable).
//!
//! ### Retries
//! - `get` makes exactly one attempt (used for the cache lookup).
//! - `get_with_retry` applies the configured [`RetryPolicy`] (used for provider pages).

pub mod error;
pub mod retry;

use bytes::Bytes;
use reqwest::{Client, Url, header};
use std::time::{Duration, Instant};

pub use error::FetchError;
pub use retry::{IsRetryable, RetryPolicy, with_retry};

/// Accept header for provider HTML pages.
pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "examdl/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Retry policy for `get_with_retry`
    pub retry: RetryPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "examdl/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
            retry: RetryPolicy::default(),
        }
    }
}

impl FetchConfig {
    /// Derive fetch settings from the application configuration.
    pub fn from_app(config: &examdl_core::AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            retry: RetryPolicy {
                max_retries: config.max_retries,
                base_backoff: config.base_backoff(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The final URL after redirects
    pub final_url: Url,
    /// Response body bytes
    pub bytes: Bytes,
}

impl FetchResponse {
    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// HTTP fetch client.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()?;

        Ok(Self { http, config })
    }

    /// Fetch a URL once, returning raw bytes and metadata.
    ///
    /// Non-success statuses are returned as `FetchError::Status`, carrying the
    /// `Retry-After` delay when the server sent one in seconds.
    pub async fn get(&self, url: &str, accept: &str, bearer: Option<&str>) -> Result<FetchResponse, FetchError> {
        let start = Instant::now();
        let url = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;

        let mut request = self.http.get(url.clone()).header(header::ACCEPT, accept);
        if let Some(token) = bearer.map(str::trim).filter(|t| !t.is_empty()) {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(FetchError::Status { status: status.as_u16(), retry_after });
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(FetchError::TooLarge { len: len as usize, max: self.config.max_bytes });
        }

        let final_url = response.url().clone();
        let bytes = response.bytes().await?;
        if bytes.len() > self.config.max_bytes {
            return Err(FetchError::TooLarge { len: bytes.len(), max: self.config.max_bytes });
        }

        let fetch_ms = start.elapsed().as_millis() as u64;
        tracing::debug!("fetched {} -> {} in {}ms ({} bytes)", url, final_url, fetch_ms, bytes.len());

        Ok(FetchResponse { final_url, bytes })
    }

    /// Fetch a URL, retrying transient failures per the configured policy.
    pub async fn get_with_retry(&self, url: &str, accept: &str) -> Result<FetchResponse, FetchError> {
        with_retry(&self.config.retry, || self.get(url, accept, None)).await
    }
}
