//! The daemon's two cache tiers: process-local metadata (object stats and
//! directory listings) and the on-disk, content-addressed file cache.
//!
//! Both tiers live for the daemon's lifetime; there is no eviction and no
//! TTL. Coherence with writers on the upstream is explicitly not a goal.

mod file;
mod metadata;

pub use file::FileCache;
pub use metadata::{MetaKey, MetadataCache, ObjectEntry};
