//! Live paginated crawl over a [`PageSource`].

use examdl_core::{Error, QuestionData};

use crate::provider::{PageSource, ProviderPage};

/// Result of crawling one certification.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    /// Questions from every fully loaded page, in page then document order.
    pub questions: Vec<QuestionData>,
    /// Number of pages that loaded successfully.
    pub pages: u32,
    /// `Error::CrawlPageFailure` for the page that aborted the crawl, if any.
    pub failure: Option<Error>,
}

impl CrawlOutcome {
    /// Index of the page that aborted the crawl.
    pub fn failed_page(&self) -> Option<u32> {
        match &self.failure {
            Some(Error::CrawlPageFailure { page, .. }) => Some(*page),
            _ => None,
        }
    }
}

/// Walks provider pages from index 1 until exhaustion or failure.
#[derive(Debug, Clone)]
pub struct Crawler<P> {
    source: P,
    max_pages: u32,
}

impl<P: PageSource> Crawler<P> {
    /// `max_pages` of 0 means unbounded.
    pub fn new(source: P, max_pages: u32) -> Self {
        Self { source, max_pages }
    }

    pub fn source(&self) -> &P {
        &self.source
    }

    /// Crawl every page for `(provider, slug)`.
    ///
    /// A failing page stops the crawl; its entries are discarded and the
    /// questions from earlier pages are returned with the failure attached.
    /// A page that comes back without a listing counts as failed when an
    /// earlier page advertised it. Pages are fetched back to back with no delay.
    pub async fn crawl(&self, provider: &str, slug: &str) -> CrawlOutcome {
        let mut outcome = CrawlOutcome::default();
        let mut advertised_last: Option<u32> = None;
        let mut page = 1u32;

        loop {
            if self.max_pages > 0 && page > self.max_pages {
                tracing::debug!(slug, max_pages = self.max_pages, "page limit reached");
                break;
            }

            let error = match self.source.fetch_page(provider, slug, page).await {
                Ok(ProviderPage::Entries { questions, last_page }) => {
                    tracing::debug!(slug, page, entries = questions.len(), "page loaded");
                    outcome.questions.extend(questions);
                    outcome.pages += 1;
                    advertised_last = last_page.or(advertised_last);
                    if advertised_last.is_some_and(|last| page >= last) {
                        break;
                    }
                    page += 1;
                    continue;
                }
                Ok(ProviderPage::Exhausted) => match advertised_last {
                    Some(last) if page <= last => Error::Parse(format!("no listing on page {page} of {last} advertised")),
                    _ => {
                        tracing::debug!(slug, page, "provider exhausted");
                        break;
                    }
                },
                Err(e) => e,
            };

            tracing::warn!(slug, page, error = %error, "page failed, keeping earlier pages");
            outcome.failure = Some(Error::CrawlPageFailure { slug: slug.to_string(), page, reason: error.to_string() });
            break;
        }

        outcome
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use examdl_core::cache::sequence_digest;
    use std::collections::HashMap;
    use std::sync::Mutex;

    pub(crate) fn question(slug: &str, page: u32, position: u32) -> QuestionData {
        QuestionData {
            number: page * 10 + position,
            topic: Some(1),
            title: None,
            body: format!("{slug} page {page} item {position}"),
            choices: Vec::new(),
            answer: "A".into(),
            discussion: Vec::new(),
            timestamp: None,
            source_url: format!("https://provider.test/{slug}/{page}/{position}"),
        }
    }

    /// One scripted page: `Some(n)` yields `n` entries, `None` fails.
    pub(crate) type Script = Vec<Option<u32>>;

    /// In-memory provider. Pages past the end of a script are exhausted.
    #[derive(Default)]
    pub(crate) struct ScriptedPages {
        scripts: HashMap<String, Script>,
        pub(crate) calls: Mutex<Vec<(String, u32)>>,
    }

    impl ScriptedPages {
        pub(crate) fn with(mut self, slug: &str, script: Script) -> Self {
            self.scripts.insert(slug.to_string(), script);
            self
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PageSource for ScriptedPages {
        async fn fetch_page(&self, _provider: &str, slug: &str, page: u32) -> Result<ProviderPage, Error> {
            self.calls.lock().unwrap().push((slug.to_string(), page));
            let script = self.scripts.get(slug).cloned().unwrap_or_default();
            match script.get(page as usize - 1) {
                None => Ok(ProviderPage::Exhausted),
                Some(None) => Err(Error::Http("status 500".into())),
                Some(Some(n)) => Ok(ProviderPage::Entries {
                    questions: (1..=*n).map(|i| question(slug, page, i)).collect(),
                    last_page: None,
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_crawl_accumulates_in_page_order() {
        let crawler = Crawler::new(ScriptedPages::default().with("az-900", vec![Some(2), Some(0), Some(1)]), 0);
        let outcome = crawler.crawl("microsoft", "az-900").await;

        assert!(outcome.failure.is_none());
        assert_eq!(outcome.pages, 3);
        let urls: Vec<&str> = outcome.questions.iter().map(|q| q.source_url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://provider.test/az-900/1/1",
                "https://provider.test/az-900/1/2",
                "https://provider.test/az-900/3/1",
            ]
        );
        // pages 1..=3 plus the exhausted page 4
        assert_eq!(crawler.source().call_count(), 4);
    }

    #[tokio::test]
    async fn test_crawl_partial_failure_keeps_earlier_pages() {
        let script = vec![Some(2), Some(3), None, Some(2), Some(2)];
        let crawler = Crawler::new(ScriptedPages::default().with("az-900", script), 0);
        let outcome = crawler.crawl("microsoft", "az-900").await;

        assert_eq!(outcome.questions.len(), 5);
        assert!(outcome.questions.iter().all(|q| !q.source_url.contains("/3/")));
        assert_eq!(outcome.pages, 2);
        assert_eq!(outcome.failed_page(), Some(3));
        assert!(outcome.failure.as_ref().unwrap().to_string().contains("page 3"));
        // pages 4 and 5 are never requested
        assert_eq!(crawler.source().call_count(), 3);
    }

    #[tokio::test]
    async fn test_crawl_first_page_empty() {
        let crawler = Crawler::new(ScriptedPages::default(), 0);
        let outcome = crawler.crawl("microsoft", "unknown").await;
        assert!(outcome.questions.is_empty());
        assert!(outcome.failure.is_none());
        assert_eq!(outcome.pages, 0);
    }

    #[tokio::test]
    async fn test_crawl_respects_max_pages() {
        let crawler = Crawler::new(ScriptedPages::default().with("az-900", vec![Some(1); 10]), 2);
        let outcome = crawler.crawl("microsoft", "az-900").await;
        assert_eq!(outcome.pages, 2);
        assert_eq!(crawler.source().call_count(), 2);
    }

    #[tokio::test]
    async fn test_crawl_is_idempotent() {
        let crawler = Crawler::new(ScriptedPages::default().with("az-900", vec![Some(3), Some(2)]), 0);
        let first = crawler.crawl("microsoft", "az-900").await;
        let second = crawler.crawl("microsoft", "az-900").await;
        assert_eq!(sequence_digest(&first.questions), sequence_digest(&second.questions));
        assert_eq!(first.questions, second.questions);
    }

    struct LastFlagged;

    #[async_trait]
    impl PageSource for LastFlagged {
        async fn fetch_page(&self, _provider: &str, slug: &str, page: u32) -> Result<ProviderPage, Error> {
            assert!(page <= 2, "crawler must stop at the advertised last page");
            Ok(ProviderPage::Entries { questions: vec![question(slug, page, 1)], last_page: Some(2) })
        }
    }

    #[tokio::test]
    async fn test_crawl_stops_at_last_page() {
        let outcome = Crawler::new(LastFlagged, 0).crawl("microsoft", "az-900").await;
        assert_eq!(outcome.pages, 2);
        assert_eq!(outcome.questions.len(), 2);
    }

    /// Advertises four pages on page 1, then serves no listing from page 3 on.
    struct ShortListing;

    #[async_trait]
    impl PageSource for ShortListing {
        async fn fetch_page(&self, _provider: &str, slug: &str, page: u32) -> Result<ProviderPage, Error> {
            match page {
                1 => Ok(ProviderPage::Entries { questions: vec![question(slug, 1, 1)], last_page: Some(4) }),
                2 => Ok(ProviderPage::Entries { questions: vec![question(slug, 2, 1)], last_page: None }),
                _ => Ok(ProviderPage::Exhausted),
            }
        }
    }

    #[tokio::test]
    async fn test_crawl_unlisted_page_within_advertised_range_fails() {
        let outcome = Crawler::new(ShortListing, 0).crawl("microsoft", "az-900").await;

        assert_eq!(outcome.pages, 2);
        assert_eq!(outcome.questions.len(), 2);
        assert_eq!(outcome.failed_page(), Some(3));
        assert!(outcome.failure.unwrap().to_string().contains("page 3 of 4"));
    }
}
