//! `DavFileSystem` implementation over the upstream facade.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use common::RemotePath;
use dav_server::davpath::DavPath;
use dav_server::fs::{
    DavDirEntry, DavFile, DavFileSystem, DavMetaData, FsError, FsFuture, FsStream, OpenOptions,
    ReadDirMeta,
};
use futures::stream;
use tracing::trace;

use crate::cache::{FileCache, MetadataCache};
use crate::upstream::{ObjectStore, UpstreamError};

use super::file::RemoteFile;
use super::fileinfo::ObjectInfo;
use super::fs_error;
use super::io::{
    basename, get_dir_info, get_file_info, is_hidden, list_directory, skip_empty, skip_hidden,
    FilterFn,
};

/// Resolve a WebDAV name (relative to the handler prefix) to a remote
/// coordinate. The first segment is the per-mount nonce and is discarded;
/// segments two and three are repository and reference; the rest, possibly
/// empty, is the path. Anything shorter does not name a remote node.
pub fn uri_for(name: &str) -> Result<RemotePath, FsError> {
    let name = name.strip_prefix('/').unwrap_or(name);
    let parts: Vec<&str> = name.splitn(4, '/').collect();
    match parts.as_slice() {
        [_nonce, repository, reference, path] => {
            Ok(RemotePath::new(*repository, *reference, *path))
        }
        [_nonce, repository, reference] if !reference.is_empty() => {
            Ok(RemotePath::new(*repository, *reference, ""))
        }
        _ => Err(FsError::NotFound),
    }
}

/// Read-only filesystem over the remote namespace.
///
/// Writes (`create_dir`, `remove_*`, `rename`, `copy`) succeed silently
/// without doing anything, which keeps mount consumers that insist on
/// issuing them happy.
#[derive(Clone)]
pub struct RemoteFs {
    inner: Arc<RemoteFsInner>,
}

pub(crate) struct RemoteFsInner {
    pub(crate) store: Arc<dyn ObjectStore>,
    pub(crate) file_cache: FileCache,
    pub(crate) metadata_cache: MetadataCache,
    pub(crate) skip_hidden: bool,
}

impl RemoteFs {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        cache_dir: PathBuf,
        skip_hidden: bool,
    ) -> io::Result<Self> {
        Ok(Self {
            inner: Arc::new(RemoteFsInner {
                store,
                file_cache: FileCache::new(cache_dir)?,
                metadata_cache: MetadataCache::new(),
                skip_hidden,
            }),
        })
    }

    pub(crate) fn inner(&self) -> &RemoteFsInner {
        &self.inner
    }

    fn dav_name(path: &DavPath) -> String {
        path.as_rel_ospath().to_string_lossy().into_owned()
    }

    async fn lookup(&self, location: &RemotePath) -> Result<ObjectInfo, UpstreamError> {
        let inner = self.inner();
        match get_file_info(&inner.metadata_cache, inner.store.as_ref(), location).await {
            Err(UpstreamError::NotFound) => {
                // Not a file, but perhaps a directory?
                get_dir_info(&inner.metadata_cache, inner.store.as_ref(), location).await
            }
            result => result,
        }
    }
}

impl DavFileSystem for RemoteFs {
    fn open<'a>(
        &'a self,
        path: &'a DavPath,
        _options: OpenOptions,
    ) -> FsFuture<'a, Box<dyn DavFile>> {
        // Write flags are ignored: the handle accepts writes and drops them.
        Box::pin(async move {
            trace!("open({:?})", path);
            let location = uri_for(&Self::dav_name(path))?;
            let info = self.lookup(&location).await.map_err(fs_error)?;
            Ok(Box::new(RemoteFile::new(self.clone(), location, info)) as Box<dyn DavFile>)
        })
    }

    fn metadata<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, Box<dyn DavMetaData>> {
        Box::pin(async move {
            trace!("metadata({:?})", path);
            let name = Self::dav_name(path);
            if self.inner().skip_hidden && is_hidden(basename(&name)) {
                return Err(FsError::NotFound);
            }
            let location = uri_for(&name)?;
            let info = self.lookup(&location).await.map_err(fs_error)?;
            Ok(Box::new(info) as Box<dyn DavMetaData>)
        })
    }

    fn read_dir<'a>(
        &'a self,
        path: &'a DavPath,
        _meta: ReadDirMeta,
    ) -> FsFuture<'a, FsStream<Box<dyn DavDirEntry>>> {
        Box::pin(async move {
            trace!("read_dir({:?})", path);
            let inner = self.inner();
            let location = uri_for(&Self::dav_name(path))?;
            if inner.skip_hidden && is_hidden(basename(&location.path)) {
                return Err(FsError::NotFound);
            }
            let filters: &[FilterFn] = if inner.skip_hidden {
                &[skip_empty, skip_hidden]
            } else {
                &[skip_empty]
            };
            let listing = list_directory(
                &inner.metadata_cache,
                inner.store.as_ref(),
                &location,
                0,
                filters,
            )
            .await
            .map_err(fs_error)?;

            let entries: Vec<Box<dyn DavDirEntry>> = listing
                .iter()
                .cloned()
                .map(|info| Box::new(RemoteDirEntry { info }) as Box<dyn DavDirEntry>)
                .collect();
            let stream = stream::iter(entries.into_iter().map(Ok));
            Ok(Box::pin(stream) as FsStream<Box<dyn DavDirEntry>>)
        })
    }

    fn create_dir<'a>(&'a self, _path: &'a DavPath) -> FsFuture<'a, ()> {
        Box::pin(async { Ok(()) })
    }

    fn remove_dir<'a>(&'a self, _path: &'a DavPath) -> FsFuture<'a, ()> {
        Box::pin(async { Ok(()) })
    }

    fn remove_file<'a>(&'a self, _path: &'a DavPath) -> FsFuture<'a, ()> {
        Box::pin(async { Ok(()) })
    }

    fn rename<'a>(&'a self, _from: &'a DavPath, _to: &'a DavPath) -> FsFuture<'a, ()> {
        Box::pin(async { Ok(()) })
    }

    fn copy<'a>(&'a self, _from: &'a DavPath, _to: &'a DavPath) -> FsFuture<'a, ()> {
        Box::pin(async { Ok(()) })
    }
}

struct RemoteDirEntry {
    info: ObjectInfo,
}

impl DavDirEntry for RemoteDirEntry {
    fn name(&self) -> Vec<u8> {
        self.info.name().as_bytes().to_vec()
    }

    fn metadata(&self) -> FsFuture<'_, Box<dyn DavMetaData>> {
        let meta = self.info.clone();
        Box::pin(async move { Ok(Box::new(meta) as Box<dyn DavMetaData>) })
    }
}
