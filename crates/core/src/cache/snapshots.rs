//! Snapshot encoding for cache entries.
//!
//! The canonical body is an envelope carrying provider, slug and fetch time.
//! A bare JSON array of questions is also accepted so hand-curated entries work.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::hash::{entry_path, sequence_digest};
use crate::Error;
use crate::model::{QuestionData, first_missing_source};

/// A complete cached question sequence for one certification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub provider: String,
    pub slug: String,
    pub fetched_at: String,
    pub questions: Vec<QuestionData>,
}

impl Snapshot {
    /// Wrap a freshly crawled sequence, stamped with the current time.
    pub fn new(provider: &str, slug: &str, questions: Vec<QuestionData>) -> Self {
        Self {
            provider: provider.to_string(),
            slug: slug.to_string(),
            fetched_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            questions,
        }
    }

    /// Decode a cache entry body fetched for `(provider, slug)`.
    ///
    /// # Errors
    ///
    /// Returns `Error::CacheMalformed` if the body is not a snapshot, belongs to
    /// another slug, or contains an entry without a source URL.
    pub fn decode(provider: &str, slug: &str, bytes: &[u8]) -> Result<Self, Error> {
        let malformed =
            |reason: String| Error::CacheMalformed { provider: provider.to_string(), slug: slug.to_string(), reason };

        let bare = bytes.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'[');

        let snapshot = if bare {
            let questions: Vec<QuestionData> =
                serde_json::from_slice(bytes).map_err(|e| malformed(format!("question array: {e}")))?;
            Self { provider: provider.to_string(), slug: slug.to_string(), fetched_at: String::new(), questions }
        } else {
            let snapshot: Self = serde_json::from_slice(bytes).map_err(|e| malformed(format!("envelope: {e}")))?;
            if !snapshot.slug.eq_ignore_ascii_case(slug) {
                return Err(malformed(format!("entry is for slug {}", snapshot.slug)));
            }
            snapshot
        };

        if let Some(idx) = first_missing_source(&snapshot.questions) {
            return Err(malformed(format!("entry {idx} has no source URL")));
        }

        Ok(snapshot)
    }

    /// Digest of the question sequence, independent of `fetched_at`.
    pub fn digest(&self) -> String {
        sequence_digest(&self.questions)
    }

    /// Write the snapshot under `root` at the same relative path the cache uses.
    ///
    /// # Errors
    ///
    /// Returns `Error::PersistFailure` if the directory or file cannot be written.
    pub fn write_to(&self, root: &Path) -> Result<PathBuf, Error> {
        let path = root.join(entry_path(&self.provider, &self.slug));
        let persist_err =
            |e: std::io::Error| Error::PersistFailure { path: path.display().to_string(), reason: e.to_string() };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(persist_err)?;
        }

        let json = serde_json::to_vec_pretty(self).map_err(|e| Error::PersistFailure {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        fs::write(&path, json).map_err(persist_err)?;

        tracing::debug!("wrote snapshot {} ({} questions)", path.display(), self.questions.len());
        Ok(path)
    }
}
