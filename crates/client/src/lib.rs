//! Client side of examdl.
//!
//! This crate provides the HTTP fetch pipeline, the remote cache client, the
//! provider page source with its HTML parsing, the live crawler and the batch
//! orchestrator used by the CLI.

pub mod cache;
pub mod crawl;
pub mod fetch;
pub mod orchestrator;
pub mod provider;

pub use cache::{CacheLookup, CacheSource, RemoteCache};
pub use crawl::{CrawlOutcome, Crawler};
pub use fetch::{FetchClient, FetchConfig, FetchError, FetchResponse, RetryPolicy};
pub use orchestrator::{CertificationReport, Orchestrator, Outcome, RunReport, Source};
pub use provider::{HttpProvider, PageSource, ProviderPage};
