//! On-disk file cache, keyed by content checksum.
//!
//! A logical entry has two physical names: `{checksum}-w` while a write is
//! in progress and `{checksum}` once published. Publication is a rename, so
//! any file named by a bare checksum is complete and safe to open
//! concurrently, even across a crash mid-write. Orphaned `-w` files from
//! crashed writers are swept on startup.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use futures::StreamExt;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use crate::upstream::ByteStream;

const WRITE_SUFFIX: &str = "-w";

#[derive(Debug)]
pub struct FileCache {
    dir: PathBuf,
    // Per-checksum write locks so concurrent misses for one object perform a
    // single upstream fetch. The map only ever grows; entries are one small
    // Arc per distinct checksum seen.
    write_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl FileCache {
    /// Open (and create if needed) a cache directory, sweeping leftover
    /// in-progress files from a previous run.
    pub fn new(dir: PathBuf) -> io::Result<Self> {
        fs::create_dir_all(&dir)?;
        let mut swept = 0usize;
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry
                .file_name()
                .to_string_lossy()
                .ends_with(WRITE_SUFFIX)
            {
                fs::remove_file(entry.path())?;
                swept += 1;
            }
        }
        if swept > 0 {
            debug!(swept, dir = %dir.display(), "removed orphaned cache write files");
        }
        Ok(Self {
            dir,
            write_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Serialize writers for one checksum. Callers hold the guard across
    /// their miss-check, upstream fetch, and [`FileCache::put`].
    pub async fn write_guard(&self, checksum: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.write_locks.lock().unwrap();
            locks
                .entry(checksum.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Open a published entry read-only. Never blocks on a concurrent
    /// writer: an entry either exists complete or not at all.
    pub fn get(&self, checksum: &str) -> io::Result<File> {
        File::open(self.dir.join(checksum))
    }

    /// Stream `body` into the cache and publish it under `checksum`.
    ///
    /// When `expected > 0` the byte count is verified before publication.
    /// On any failure the staging file is deleted and the error surfaced;
    /// nothing partial ever becomes visible under the bare checksum name.
    pub async fn put(
        &self,
        checksum: &str,
        mut body: ByteStream,
        expected: i64,
    ) -> io::Result<File> {
        let staging = self.dir.join(format!("{checksum}{WRITE_SUFFIX}"));
        let mut out = File::create(&staging)?;
        let mut written: i64 = 0;
        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => {
                    drop(out);
                    let _ = fs::remove_file(&staging);
                    return Err(err);
                }
            };
            if let Err(err) = out.write_all(&chunk) {
                drop(out);
                let _ = fs::remove_file(&staging);
                return Err(err);
            }
            written += chunk.len() as i64;
        }
        if expected > 0 && written != expected {
            drop(out);
            let _ = fs::remove_file(&staging);
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("object size mismatch: got {written} bytes, expected {expected}"),
            ));
        }
        out.sync_all()?;
        drop(out);
        fs::rename(&staging, self.dir.join(checksum))?;
        self.get(checksum)
    }
}
