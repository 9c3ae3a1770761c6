//! Typed facade over the upstream object-store HTTP API.
//!
//! The daemon consumes exactly three upstream operations: stat one object,
//! list a prefix page, and fetch an object body. [`ObjectStore`] is the seam
//! between the filesystem adapter and the wire; the production
//! implementation is [`UpstreamClient`], and tests substitute an in-memory
//! fake.

mod client;

use std::io;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

pub use client::UpstreamClient;

/// Streaming object body. Bodies are copied into the file cache chunk by
/// chunk and are never buffered whole in memory.
pub type ByteStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send + 'static>>;

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Upstream 404, and the domain sentinel for "no such file or
    /// directory" produced by exhausted probes.
    #[error("not found")]
    NotFound,
    /// Any non-2xx, non-404 status.
    #[error("upstream error: HTTP {0}")]
    Http(StatusCode),
    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl UpstreamError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, UpstreamError::NotFound)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathType {
    Object,
    CommonPrefix,
}

/// One upstream stat record. `checksum` is the content identifier and
/// doubles as the file-cache key; it is empty only for common prefixes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectStats {
    pub path: String,
    pub path_type: PathType,
    #[serde(default)]
    pub checksum: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<i64>,
    #[serde(default)]
    pub mtime: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub has_more: bool,
    #[serde(default)]
    pub next_offset: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectStatsList {
    pub pagination: Pagination,
    pub results: Vec<ObjectStats>,
}

/// Parameters for one listing page. `delimiter` is always `"/"` in this
/// system; `prefix` ends with `"/"` for directory listings.
#[derive(Debug, Clone)]
pub struct ListParams {
    pub prefix: String,
    pub delimiter: String,
    pub after: String,
    pub amount: u64,
}

#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    async fn stat_object(
        &self,
        repository: &str,
        reference: &str,
        path: &str,
    ) -> Result<ObjectStats, UpstreamError>;

    async fn list_objects(
        &self,
        repository: &str,
        reference: &str,
        params: &ListParams,
    ) -> Result<ObjectStatsList, UpstreamError>;

    async fn get_object(
        &self,
        repository: &str,
        reference: &str,
        path: &str,
        presign: bool,
    ) -> Result<ByteStream, UpstreamError>;
}
