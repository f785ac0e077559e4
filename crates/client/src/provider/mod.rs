//! Question-bank provider boundary.
//!
//! A provider is addressed by `(provider, slug, page)` and answers with either
//! a page of question entries or an exhaustion signal. [`HttpProvider`] walks
//! the public discussion listing; tests substitute their own [`PageSource`].

pub mod parse;

use async_trait::async_trait;
use url::Url;

use examdl_core::{Error, QuestionData};

use crate::fetch::{ACCEPT_HTML, FetchClient, FetchError};

pub use parse::{ListingEntry, ListingPage, matches_slug, parse_listing, parse_question};

/// One provider page as seen by the crawler.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderPage {
    /// Entries of this page belonging to the slug, in document order.
    ///
    /// `questions` may be empty when the page lists only other certifications.
    /// `last_page` is the final page index the provider advertises, if any.
    Entries { questions: Vec<QuestionData>, last_page: Option<u32> },
    /// No listing at this page index.
    ///
    /// The crawler treats this as a page failure when an earlier page
    /// advertised more pages.
    Exhausted,
}

/// Source of provider pages.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch page `page` (1-based) for `(provider, slug)`.
    ///
    /// Any error fails the whole page; partial pages are never returned.
    async fn fetch_page(&self, provider: &str, slug: &str, page: u32) -> Result<ProviderPage, Error>;
}

/// Provider backed by the public discussion listing.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    fetch: FetchClient,
    base_url: Url,
}

impl HttpProvider {
    /// Create a provider rooted at `base_url` (e.g. `https://www.examtopics.com`).
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if `base_url` does not parse.
    pub fn new(fetch: FetchClient, base_url: &str) -> Result<Self, Error> {
        let normalized = format!("{}/", base_url.trim().trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|e| Error::InvalidInput(format!("{base_url}: {e}")))?;
        Ok(Self { fetch, base_url })
    }

    /// URL of listing page `page` for `provider`.
    pub fn listing_url(&self, provider: &str, page: u32) -> Result<Url, Error> {
        self.base_url
            .join(&format!("discussions/{}/{page}/", provider.trim().to_lowercase()))
            .map_err(|e| Error::InvalidInput(e.to_string()))
    }

    async fn fetch_question(&self, entry: &ListingEntry) -> Result<QuestionData, Error> {
        let response = self.fetch.get_with_retry(&entry.url, ACCEPT_HTML).await?;
        parse_question(&response.text(), &entry.url)
    }
}

#[async_trait]
impl PageSource for HttpProvider {
    async fn fetch_page(&self, provider: &str, slug: &str, page: u32) -> Result<ProviderPage, Error> {
        let url = self.listing_url(provider, page)?;

        let response = match self.fetch.get_with_retry(url.as_str(), ACCEPT_HTML).await {
            Ok(response) => response,
            Err(e) if e.is_not_found() && page > 1 => return Ok(ProviderPage::Exhausted),
            Err(e) => return Err(listing_error(&url, &e)),
        };

        let listing = parse_listing(&response.text(), &response.final_url);
        if listing.entries.is_empty() {
            return Ok(ProviderPage::Exhausted);
        }
        if let Some(last_page) = listing.last_page
            && page > last_page
        {
            return Ok(ProviderPage::Exhausted);
        }

        let matching: Vec<&ListingEntry> = listing.entries.iter().filter(|e| matches_slug(e, slug)).collect();
        tracing::debug!(
            provider,
            slug,
            page,
            listed = listing.entries.len(),
            matching = matching.len(),
            "parsed listing page"
        );

        let mut questions = Vec::with_capacity(matching.len());
        for entry in matching {
            questions.push(self.fetch_question(entry).await?);
        }

        Ok(ProviderPage::Entries { questions, last_page: listing.last_page })
    }
}

fn listing_error(url: &Url, err: &FetchError) -> Error {
    Error::Http(format!("{url}: {err}"))
}
