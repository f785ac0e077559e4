//! Batch retrieval over a certification catalog.
//!
//! Each certification goes through
//! `CacheLookup -> (Hit: done) | (Miss: LiveCrawl -> (non-empty: done) | (empty: skipped))`.
//! Certifications run strictly one after another. After any certification that
//! reached the provider, the next one waits for the configured delay first.

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

use examdl_core::{Catalog, CertificationRecord, Error, QuestionData, ResultSink, RetrievalConfig, Snapshot};

use crate::cache::{CacheLookup, CacheSource};
use crate::crawl::Crawler;
use crate::provider::PageSource;

/// Where a certification's questions came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Live,
}

/// Final state of one certification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed { source: Source, count: usize, output: PathBuf, partial_failure_page: Option<u32> },
    /// Neither the cache nor the crawl produced questions.
    Skipped,
    /// Rendering or persisting failed.
    Failed(String),
}

/// Per-certification record in the run report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificationReport {
    pub code: String,
    pub slug: String,
    pub outcome: Outcome,
}

/// Totals for one batch run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// All data rows in the catalog, valid or not.
    pub total_rows: usize,
    pub invalid_rows: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub from_cache: usize,
    /// Throttle waits that ran to completion.
    pub delays: usize,
    pub cancelled: bool,
    pub warnings: Vec<String>,
    pub certifications: Vec<CertificationReport>,
}

impl RunReport {
    /// Certifications processed (valid rows attempted).
    pub fn processed(&self) -> usize {
        self.attempted
    }

    /// Codes worth running again: skipped, failed, or cut short by a page failure.
    pub fn rerun_codes(&self) -> Vec<&str> {
        self.certifications
            .iter()
            .filter(|c| match &c.outcome {
                Outcome::Completed { partial_failure_page, .. } => partial_failure_page.is_some(),
                Outcome::Skipped | Outcome::Failed(_) => true,
            })
            .map(|c| c.code.as_str())
            .collect()
    }

    fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }
}

/// Drives cache lookup, live crawl and output for every catalog row.
pub struct Orchestrator<C, P, S> {
    config: RetrievalConfig,
    cache: Option<C>,
    crawler: Crawler<P>,
    sink: S,
    cancel: CancellationToken,
}

impl<C, P, S> Orchestrator<C, P, S>
where
    C: CacheSource,
    P: PageSource,
    S: ResultSink,
{
    /// `cache` is consulted only when `config.cache_enabled` is set.
    pub fn new(config: RetrievalConfig, cache: Option<C>, crawler: Crawler<P>, sink: S) -> Self {
        Self { config, cache, crawler, sink, cancel: CancellationToken::new() }
    }

    /// Stop before the next certification when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Process every row of `catalog` in file order.
    pub async fn run(&self, catalog: &Catalog) -> RunReport {
        let mut report = RunReport { total_rows: catalog.total_rows(), ..Default::default() };
        let mut throttle_pending = false;

        for row in &catalog.rows {
            let record = match &row.record {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(line = row.line, error = %e, "skipping invalid catalog row");
                    report.invalid_rows += 1;
                    report.warn(e.to_string());
                    continue;
                }
            };

            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            if throttle_pending && !self.config.delay.is_zero() {
                tracing::debug!(delay_secs = self.config.delay.as_secs_f64(), "throttling before next certification");
                tokio::select! {
                    _ = self.cancel.cancelled() => {
                        report.cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(self.config.delay) => report.delays += 1,
                }
            }

            report.attempted += 1;
            let (outcome, crawled) = self.process(record, &mut report).await;
            throttle_pending = crawled;

            match &outcome {
                Outcome::Completed { source, .. } => {
                    report.succeeded += 1;
                    if *source == Source::Cache {
                        report.from_cache += 1;
                    }
                }
                Outcome::Skipped => report.skipped += 1,
                Outcome::Failed(_) => report.failed += 1,
            }

            report.certifications.push(CertificationReport {
                code: record.code.clone(),
                slug: record.slug.clone(),
                outcome,
            });
        }

        if report.cancelled {
            tracing::warn!(attempted = report.attempted, "run cancelled");
        }

        report
    }

    /// Returns the outcome and whether the provider was contacted.
    async fn process(&self, record: &CertificationRecord, report: &mut RunReport) -> (Outcome, bool) {
        let provider = self.config.provider.as_str();
        let (code, slug) = (record.code.as_str(), record.slug.as_str());
        tracing::info!(code, slug, "processing certification");

        if self.config.cache_enabled
            && let Some(cache) = &self.cache
        {
            let token = self.config.access_token.as_deref();
            if let CacheLookup::Hit(questions) = cache.lookup(provider, slug, token).await {
                tracing::info!(code, slug, questions = questions.len(), "resolved from cache");
                return (self.persist(record, &questions, Source::Cache, None, report), false);
            }
        }

        let crawl = self.crawler.crawl(provider, slug).await;
        let partial_failure_page = crawl.failed_page();
        if let Some(failure) = &crawl.failure {
            tracing::warn!(code, slug, page = partial_failure_page, kept = crawl.questions.len(), "crawl incomplete");
            report.warn(format!("{code}: {failure}"));
        }

        if crawl.questions.is_empty() {
            let empty = Error::CrawlEmptyResult { code: code.to_string(), slug: slug.to_string() };
            tracing::warn!(code, slug, "no questions from cache or provider, skipping");
            report.warn(empty.to_string());
            return (Outcome::Skipped, true);
        }

        tracing::info!(code, slug, questions = crawl.questions.len(), pages = crawl.pages, "crawled provider");

        if let Some(dir) = &self.config.snapshot_dir {
            match Snapshot::new(provider, slug, crawl.questions.clone()).write_to(dir) {
                Ok(path) => tracing::debug!(code, path = %path.display(), "snapshot exported"),
                Err(e) => {
                    tracing::warn!(code, slug, error = %e, "snapshot export failed");
                    report.warn(format!("{code}: {e}"));
                }
            }
        }

        (self.persist(record, &crawl.questions, Source::Live, partial_failure_page, report), true)
    }

    fn persist(
        &self, record: &CertificationRecord, questions: &[QuestionData], source: Source, partial_failure_page: Option<u32>,
        report: &mut RunReport,
    ) -> Outcome {
        match self.sink.write(record, questions) {
            Ok(output) => {
                tracing::info!(code = %record.code, path = %output.display(), questions = questions.len(), "saved");
                Outcome::Completed { source, count: questions.len(), output, partial_failure_page }
            }
            Err(e) => {
                tracing::warn!(code = %record.code, slug = %record.slug, error = %e, "failed to write results");
                report.warn(format!("{}: {e}", record.code));
                Outcome::Failed(e.to_string())
            }
        }
    }
}
