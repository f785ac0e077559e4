//! Unified error types for examdl.
//!
//! Only `CatalogUnreadable` and `CatalogEmpty` stop a batch. Everything else is
//! scoped to a single certification and is either logged as a soft failure or
//! reported as that certification's outcome.

/// Unified error types for the retrieval pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The catalog file could not be opened or decoded.
    #[error("CATALOG_UNREADABLE: {path}: {reason}")]
    CatalogUnreadable { path: String, reason: String },

    /// The catalog has no data rows after the header.
    #[error("CATALOG_EMPTY: {0}")]
    CatalogEmpty(String),

    /// A catalog row is missing required fields.
    #[error("CATALOG_ROW_INVALID: line {line}: {reason}")]
    CatalogRowInvalid { line: usize, reason: String },

    /// The cache service could not be reached or refused the request.
    #[error("CACHE_UNAVAILABLE: {provider}/{slug}: {reason}")]
    CacheUnavailable { provider: String, slug: String, reason: String },

    /// The cache entry exists but does not decode into questions.
    #[error("CACHE_MALFORMED: {provider}/{slug}: {reason}")]
    CacheMalformed { provider: String, slug: String, reason: String },

    /// A provider page failed to load or had an unexpected shape.
    #[error("CRAWL_PAGE_FAILURE: {slug} page {page}: {reason}")]
    CrawlPageFailure { slug: String, page: u32, reason: String },

    /// Neither the cache nor the live crawl produced any questions.
    #[error("CRAWL_EMPTY_RESULT: {code} ({slug})")]
    CrawlEmptyResult { code: String, slug: String },

    /// Writing the rendered output file failed.
    #[error("RENDER_FAILED: {path}: {reason}")]
    RenderFailure { path: String, reason: String },

    /// Writing the link list failed.
    #[error("PERSIST_FAILED: {path}: {reason}")]
    PersistFailure { path: String, reason: String },

    /// HTTP transport or status error.
    #[error("HTTP_ERROR: {0}")]
    Http(String),

    /// Response body could not be parsed.
    #[error("PARSE_ERROR: {0}")]
    Parse(String),

    /// Invalid input parameters.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Whether this error aborts the whole batch.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(self, Error::CatalogUnreadable { .. } | Error::CatalogEmpty(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::CrawlPageFailure { slug: "az-900".into(), page: 3, reason: "status 502".into() };
        let msg = err.to_string();
        assert!(msg.contains("CRAWL_PAGE_FAILURE"));
        assert!(msg.contains("az-900"));
        assert!(msg.contains("page 3"));
    }

    #[test]
    fn test_row_invalid_mentions_line() {
        let err = Error::CatalogRowInvalid { line: 4, reason: "expected at least 4 columns, found 3".into() };
        assert!(err.to_string().contains("line 4"));
    }

    #[test]
    fn test_classification() {
        let soft = Error::CacheMalformed { provider: "p".into(), slug: "s".into(), reason: "eof".into() };
        assert!(!soft.is_batch_fatal());

        let fatal = Error::CatalogEmpty("catalog.csv".into());
        assert!(fatal.is_batch_fatal());

        let unreadable = Error::CatalogUnreadable { path: "catalog.csv".into(), reason: "denied".into() };
        assert!(unreadable.is_batch_fatal());

        let render = Error::RenderFailure { path: "out.md".into(), reason: "denied".into() };
        assert!(!render.is_batch_fatal());
    }
}
