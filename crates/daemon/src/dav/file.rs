//! Open-file handles backed by the content-addressed file cache.

use std::fmt;
use std::fs::File;
use std::io::{self, SeekFrom};

use bytes::{Buf, Bytes};
use common::RemotePath;
use dav_server::fs::{DavFile, DavMetaData, FsError, FsFuture};
use tracing::{debug, warn};

use super::filesystem::RemoteFs;
use super::fileinfo::ObjectInfo;
use super::fs_error;
use super::io::{basename, is_hidden};

/// One opened file (or directory) of the remote tree.
///
/// The first read acquires the cache handle, fetching and publishing the
/// object on a miss. Reads use positional I/O against that handle plus a
/// per-open virtual offset, so concurrent reads of the same open file never
/// contend on an OS file cursor. Writes are accepted and dropped.
pub struct RemoteFile {
    fs: RemoteFs,
    location: RemotePath,
    info: ObjectInfo,
    handle: Option<File>,
    virtual_offset: u64,
}

impl RemoteFile {
    pub(crate) fn new(fs: RemoteFs, location: RemotePath, info: ObjectInfo) -> Self {
        Self {
            fs,
            location,
            info,
            handle: None,
            virtual_offset: 0,
        }
    }

    fn hidden(&self) -> bool {
        self.fs.inner().skip_hidden && is_hidden(basename(&self.location.path))
    }

    /// Open the cached content, fetching from upstream on a miss. The
    /// per-checksum write guard spans the miss-check, the upstream fetch,
    /// and publication, so concurrent misses collapse into one fetch.
    async fn ensure_handle(&mut self) -> Result<(), FsError> {
        if self.handle.is_some() {
            return Ok(());
        }
        let stat = self.info.stat.as_ref().ok_or(FsError::GeneralFailure)?;
        let checksum = stat.checksum.clone();
        let expected = stat.size_bytes.unwrap_or(0);
        let fs = self.fs.clone();
        let inner = fs.inner();

        let _guard = inner.file_cache.write_guard(&checksum).await;
        let file = match inner.file_cache.get(&checksum) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(location = %self.location, checksum = %checksum, "file cache miss");
                let body = inner
                    .store
                    .get_object(
                        &self.location.repository,
                        &self.location.reference,
                        &self.location.path,
                        true,
                    )
                    .await
                    .map_err(fs_error)?;
                inner
                    .file_cache
                    .put(&checksum, body, expected)
                    .await
                    .map_err(|err| {
                        warn!(error = %err, checksum = %checksum, "file cache write failed");
                        FsError::GeneralFailure
                    })?
            }
            Err(err) => {
                warn!(error = %err, checksum = %checksum, "file cache read failed");
                return Err(FsError::GeneralFailure);
            }
        };
        self.handle = Some(file);
        Ok(())
    }
}

impl fmt::Debug for RemoteFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteFile")
            .field("location", &self.location)
            .field("offset", &self.virtual_offset)
            .finish_non_exhaustive()
    }
}

fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::FileExt;
        file.read_at(buf, offset)
    }
    #[cfg(windows)]
    {
        use std::os::windows::fs::FileExt;
        file.seek_read(buf, offset)
    }
}

impl DavFile for RemoteFile {
    fn metadata(&mut self) -> FsFuture<'_, Box<dyn DavMetaData>> {
        Box::pin(async move {
            if self.hidden() {
                return Err(FsError::NotFound);
            }
            Ok(Box::new(self.info.clone()) as Box<dyn DavMetaData>)
        })
    }

    fn read_bytes(&mut self, count: usize) -> FsFuture<'_, Bytes> {
        Box::pin(async move {
            if self.hidden() {
                return Err(FsError::NotFound);
            }
            self.ensure_handle().await?;
            let file = self.handle.as_ref().ok_or(FsError::GeneralFailure)?;
            let mut buf = vec![0u8; count];
            let n = read_at(file, &mut buf, self.virtual_offset).map_err(|err| {
                warn!(error = %err, location = %self.location, "cache read failed");
                FsError::GeneralFailure
            })?;
            buf.truncate(n);
            self.virtual_offset += n as u64;
            Ok(Bytes::from(buf))
        })
    }

    fn seek(&mut self, pos: SeekFrom) -> FsFuture<'_, u64> {
        Box::pin(async move {
            if self.hidden() {
                return Err(FsError::NotFound);
            }
            let offset = match pos {
                SeekFrom::Start(n) => n as i64,
                SeekFrom::End(n) => self.info.size() as i64 + n,
                SeekFrom::Current(n) => self.virtual_offset as i64 + n,
            };
            if offset < 0 {
                return Err(FsError::GeneralFailure);
            }
            self.virtual_offset = offset as u64;
            Ok(self.virtual_offset)
        })
    }

    fn write_buf(&mut self, _buf: Box<dyn Buf + Send>) -> FsFuture<'_, ()> {
        // Read-only tree: accept and drop.
        Box::pin(async { Ok(()) })
    }

    fn write_bytes(&mut self, _buf: Bytes) -> FsFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }

    fn flush(&mut self) -> FsFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
}
