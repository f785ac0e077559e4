//! Cache entry format shared by the remote cache reader and the snapshot exporter.
//!
//! A cache entry is a complete, previously fetched question sequence for one
//! `(provider, slug)` pair. Entries are trusted as-is when present.

pub mod hash;
pub mod snapshots;

pub use hash::{entry_path, sequence_digest};
pub use snapshots::Snapshot;
