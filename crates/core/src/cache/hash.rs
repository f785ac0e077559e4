//! Cache keys and content digests.

use sha2::{Digest, Sha256};

use crate::model::QuestionData;

/// Relative object path of the cache entry for a `(provider, slug)` pair.
pub fn entry_path(provider: &str, slug: &str) -> String {
    format!("{}/{}.json", provider.trim().to_lowercase(), slug.trim())
}

/// SHA-256 hex digest of a question sequence in its serialized form.
///
/// Two sequences with the same content in the same order share a digest.
pub fn sequence_digest(questions: &[QuestionData]) -> String {
    let mut hasher = Sha256::new();
    for question in questions {
        // Serializing a plain data struct cannot fail.
        let bytes = serde_json::to_vec(question).unwrap_or_default();
        hasher.update(&bytes);
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}
