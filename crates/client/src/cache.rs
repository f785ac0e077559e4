//! Remote cache lookup.
//!
//! The cache holds complete question snapshots keyed by `(provider, slug)` at
//! `{base}/{provider}/{slug}.json`. A lookup is a single attempt: any failure
//! is logged and reported as a miss so the caller can fall back to crawling.

use async_trait::async_trait;
use examdl_core::cache::entry_path;
use examdl_core::{Error, QuestionData, Snapshot};

use crate::fetch::{FetchClient, FetchError};

/// Accept header for cache entries. The GitHub raw media type lets a contents
/// API base URL serve the file body directly.
pub const ACCEPT_CACHE: &str = "application/vnd.github.raw+json, application/json;q=0.9";

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// A complete, non-empty question sequence.
    Hit(Vec<QuestionData>),
    /// No usable entry.
    Miss,
}

/// Source of previously fetched question sequences.
#[async_trait]
pub trait CacheSource: Send + Sync {
    /// Look up the entry for `(provider, slug)`. Never fails; problems are a `Miss`.
    async fn lookup(&self, provider: &str, slug: &str, token: Option<&str>) -> CacheLookup;
}

/// Cache client for a static or GitHub-hosted snapshot store.
#[derive(Debug, Clone)]
pub struct RemoteCache {
    fetch: FetchClient,
    base_url: String,
}

impl RemoteCache {
    /// Create a cache client rooted at `base_url`.
    pub fn new(fetch: FetchClient, base_url: &str) -> Self {
        Self { fetch, base_url: base_url.trim_end_matches('/').to_string() }
    }

    /// URL of the entry for `(provider, slug)`.
    pub fn entry_url(&self, provider: &str, slug: &str) -> String {
        format!("{}/{}", self.base_url, entry_path(provider, slug))
    }

    /// Fetch and decode the snapshot for `(provider, slug)`.
    ///
    /// Returns `Ok(None)` when the cache has no entry.
    ///
    /// # Errors
    ///
    /// Returns `Error::CacheUnavailable` on transport or status failures and
    /// `Error::CacheMalformed` when the body does not decode.
    pub async fn fetch_snapshot(&self, provider: &str, slug: &str, token: Option<&str>) -> Result<Option<Snapshot>, Error> {
        let url = self.entry_url(provider, slug);

        let response = match self.fetch.get(&url, ACCEPT_CACHE, token).await {
            Ok(response) => response,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(unavailable(provider, slug, &e)),
        };

        Snapshot::decode(provider, slug, &response.bytes).map(Some)
    }
}

fn unavailable(provider: &str, slug: &str, err: &FetchError) -> Error {
    let reason = match err {
        FetchError::Status { status: 401 | 403, .. } => format!("{err} (check the access token)"),
        _ => err.to_string(),
    };
    Error::CacheUnavailable { provider: provider.to_string(), slug: slug.to_string(), reason }
}

#[async_trait]
impl CacheSource for RemoteCache {
    async fn lookup(&self, provider: &str, slug: &str, token: Option<&str>) -> CacheLookup {
        match self.fetch_snapshot(provider, slug, token).await {
            Ok(Some(snapshot)) if !snapshot.questions.is_empty() => {
                tracing::debug!(provider, slug, questions = snapshot.questions.len(), "cache hit");
                CacheLookup::Hit(snapshot.questions)
            }
            Ok(Some(_)) => {
                tracing::debug!(provider, slug, "cache entry is empty");
                CacheLookup::Miss
            }
            Ok(None) => {
                tracing::debug!(provider, slug, "no cache entry");
                CacheLookup::Miss
            }
            Err(e) => {
                tracing::warn!(provider, slug, error = %e, "cache lookup failed, treating as miss");
                CacheLookup::Miss
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchConfig, RetryPolicy};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cache(server: &MockServer) -> RemoteCache {
        let fetch = FetchClient::new(FetchConfig { retry: RetryPolicy::none(), ..Default::default() }).unwrap();
        RemoteCache::new(fetch, &format!("{}/data/", server.uri()))
    }

    const ENTRY: &str = r#"{
        "provider": "microsoft",
        "slug": "az-900",
        "fetched_at": "2025-03-01T00:00:00Z",
        "questions": [
            {"number": 1, "body": "First", "answer": "A", "source_url": "https://example.com/1"},
            {"number": 2, "body": "Second", "answer": "B", "source_url": "https://example.com/2"}
        ]
    }"#;

    #[test]
    fn test_entry_url() {
        let fetch = FetchClient::new(FetchConfig::default()).unwrap();
        let cache = RemoteCache::new(fetch, "https://cache.example.com/root/");
        assert_eq!(cache.entry_url("Microsoft", "az-900"), "https://cache.example.com/root/microsoft/az-900.json");
    }

    #[tokio::test]
    async fn test_lookup_hit_preserves_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/microsoft/az-900.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ENTRY))
            .mount(&server)
            .await;

        let lookup = cache(&server).lookup("microsoft", "az-900", None).await;
        let CacheLookup::Hit(questions) = lookup else { panic!("expected hit") };
        let numbers: Vec<u32> = questions.iter().map(|q| q.number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_lookup_attaches_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/microsoft/az-900.json"))
            .and(header("authorization", "Bearer ghp_token"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ENTRY))
            .expect(1)
            .mount(&server)
            .await;

        let lookup = cache(&server).lookup("microsoft", "az-900", Some("ghp_token")).await;
        assert!(matches!(lookup, CacheLookup::Hit(questions) if questions.len() == 2));
    }

    #[tokio::test]
    async fn test_lookup_not_found_is_miss() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let cache = cache(&server);
        assert_eq!(cache.lookup("microsoft", "az-900", None).await, CacheLookup::Miss);
        assert!(cache.fetch_snapshot("microsoft", "az-900", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lookup_server_error_is_single_attempt_miss() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let cache = cache(&server);
        assert_eq!(cache.lookup("microsoft", "az-900", None).await, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_lookup_forbidden_mentions_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let result = cache(&server).fetch_snapshot("microsoft", "az-900", Some("bad")).await;
        assert!(matches!(result, Err(Error::CacheUnavailable { reason, .. }) if reason.contains("access token")));
    }

    #[tokio::test]
    async fn test_lookup_malformed_is_miss() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"questions": [{"number": "#))
            .mount(&server)
            .await;

        let cache = cache(&server);
        assert_eq!(cache.lookup("microsoft", "az-900", None).await, CacheLookup::Miss);
        assert!(matches!(
            cache.fetch_snapshot("microsoft", "az-900", None).await,
            Err(Error::CacheMalformed { .. })
        ));
    }

    #[tokio::test]
    async fn test_lookup_empty_entry_is_miss() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;

        assert_eq!(cache(&server).lookup("microsoft", "az-900", None).await, CacheLookup::Miss);
    }
}
