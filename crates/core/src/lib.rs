//! Core types and shared functionality for examdl.
//!
//! This crate provides:
//! - The question model shared by the cache and crawl paths
//! - Unified error types
//! - Layered configuration
//! - Catalog loading, output rendering and link persistence
//! - The cache snapshot format

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod model;
pub mod output;

pub use cache::Snapshot;
pub use catalog::{Catalog, CatalogRow};
pub use config::{AppConfig, ConfigError, RetrievalConfig};
pub use error::Error;
pub use model::{CertificationRecord, Choice, Discussion, FileFormat, QuestionData};
pub use output::{FileSink, ResultSink};
