//! The file-or-directory metadata view handed to the WebDAV layer.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use common::RemotePath;
use dav_server::fs::{DavMetaData, FsError};

use crate::upstream::ObjectStats;

/// Metadata for one node of the remote tree: either a real object (with its
/// upstream stat) or a directory synthesized from a common prefix or probe.
///
/// A directory reports size zero and the current time as its mtime; a file
/// reports its stat values, and its checksum doubles as the WebDAV ETag.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub location: RemotePath,
    pub dir: bool,
    pub stat: Option<ObjectStats>,
}

impl ObjectInfo {
    pub fn file(location: RemotePath, stat: ObjectStats) -> Self {
        Self {
            location,
            dir: false,
            stat: Some(stat),
        }
    }

    pub fn directory(location: RemotePath) -> Self {
        Self {
            location,
            dir: true,
            stat: None,
        }
    }

    /// Basename of the coordinate's path.
    pub fn name(&self) -> &str {
        self.location.basename()
    }

    pub fn size(&self) -> u64 {
        if self.dir {
            return 0;
        }
        self.stat
            .as_ref()
            .and_then(|s| s.size_bytes)
            .unwrap_or(0)
            .max(0) as u64
    }

    pub fn checksum(&self) -> Option<&str> {
        if self.dir {
            return None;
        }
        self.stat
            .as_ref()
            .map(|s| s.checksum.as_str())
            .filter(|c| !c.is_empty())
    }
}

impl DavMetaData for ObjectInfo {
    fn len(&self) -> u64 {
        self.size()
    }

    fn modified(&self) -> Result<SystemTime, FsError> {
        match &self.stat {
            Some(stat) if !self.dir && stat.mtime >= 0 => {
                Ok(UNIX_EPOCH + Duration::from_secs(stat.mtime as u64))
            }
            _ => Ok(SystemTime::now()),
        }
    }

    fn is_dir(&self) -> bool {
        self.dir
    }

    fn etag(&self) -> Option<String> {
        self.checksum().map(str::to_string)
    }
}
