//! Read-only WebDAV adapter over the remote object store.
//!
//! Implements the `dav_server` filesystem traits on top of the upstream
//! facade and the two cache tiers. The WebDAV URL layout is
//! `/{nonce}/{repository}/{ref}/{path...}` under the handler prefix; the
//! nonce is generated per mount so mount consumers never reuse cached
//! coordinates across unrelated mounts, and it is discarded on parsing.

mod file;
mod fileinfo;
mod filesystem;
mod io;

use dav_server::fs::FsError;
use tracing::warn;

use crate::upstream::UpstreamError;

pub use file::RemoteFile;
pub use fileinfo::ObjectInfo;
pub use filesystem::{uri_for, RemoteFs};

/// Translate an upstream failure into the WebDAV error space. Anything that
/// is not a clean not-found is logged here, once, at the boundary.
pub(crate) fn fs_error(err: UpstreamError) -> FsError {
    match err {
        UpstreamError::NotFound => FsError::NotFound,
        err => {
            warn!(error = %err, "upstream request failed");
            FsError::GeneralFailure
        }
    }
}
