//! Integration tests for the mount daemon: the control API, the WebDAV
//! surface, and the terminate flow, all over real loopback HTTP.
//!
//! The OS mount helpers are not exercised here (attaching a kernel mount
//! needs a real WebDAV consumer and privileges); everything up to that
//! boundary is.

use std::net::TcpListener as StdTcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use common::{MountMode, RemotePath};
use futures::stream;
use tempfile::TempDir;

use lakemount_daemon::process::is_server_running;
use lakemount_daemon::server::api::{
    ApiClient, ListMountsRequest, RegisterMountRequest, TerminateRequest, UnmountRequest,
};
use lakemount_daemon::server::{run_server, MountInfo};
use lakemount_daemon::upstream::{
    ByteStream, ListParams, ObjectStats, ObjectStatsList, ObjectStore, Pagination, PathType,
    UpstreamError,
};

/// Single-object upstream fake, counting body fetches.
struct OneObjectStore {
    path: String,
    content: Bytes,
    get_calls: AtomicUsize,
}

impl OneObjectStore {
    fn new(path: &str, content: &[u8]) -> Self {
        Self {
            path: path.to_string(),
            content: Bytes::copy_from_slice(content),
            get_calls: AtomicUsize::new(0),
        }
    }

    fn stat(&self) -> ObjectStats {
        ObjectStats {
            path: self.path.clone(),
            path_type: PathType::Object,
            checksum: "itest-checksum".to_string(),
            size_bytes: Some(self.content.len() as i64),
            mtime: 1_700_000_000,
        }
    }
}

#[async_trait]
impl ObjectStore for OneObjectStore {
    async fn stat_object(
        &self,
        _repository: &str,
        _reference: &str,
        path: &str,
    ) -> Result<ObjectStats, UpstreamError> {
        if path == self.path {
            Ok(self.stat())
        } else {
            Err(UpstreamError::NotFound)
        }
    }

    async fn list_objects(
        &self,
        _repository: &str,
        _reference: &str,
        params: &ListParams,
    ) -> Result<ObjectStatsList, UpstreamError> {
        let results = if self.path.starts_with(&params.prefix) {
            vec![self.stat()]
        } else {
            Vec::new()
        };
        Ok(ObjectStatsList {
            pagination: Pagination::default(),
            results,
        })
    }

    async fn get_object(
        &self,
        _repository: &str,
        _reference: &str,
        path: &str,
        _presign: bool,
    ) -> Result<ByteStream, UpstreamError> {
        if path != self.path {
            return Err(UpstreamError::NotFound);
        }
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let chunks: Vec<std::io::Result<Bytes>> = vec![Ok(self.content.clone())];
        Ok(Box::pin(stream::iter(chunks)) as ByteStream)
    }
}

/// Pick a free loopback port, start the daemon on it, and wait until it is
/// accepting connections.
async fn start_daemon(store: Arc<OneObjectStore>) -> (String, TempDir) {
    let probe = StdTcpListener::bind("127.0.0.1:0").unwrap();
    let addr = probe.local_addr().unwrap().to_string();
    drop(probe);

    let cache_dir = TempDir::new().unwrap();
    {
        let addr = addr.clone();
        let cache = cache_dir.path().to_path_buf();
        tokio::spawn(async move {
            run_server(&addr, cache, store).await.unwrap();
        });
    }

    for _ in 0..50 {
        if is_server_running(&addr).unwrap() {
            return (addr, cache_dir);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("daemon did not come up on {addr}");
}

fn mount_at(local: &str) -> MountInfo {
    MountInfo {
        remote: RemotePath::new("repo", "main", "data"),
        local_path: local.to_string(),
        mode: MountMode::ReadOnly,
    }
}

#[tokio::test]
async fn control_api_lifecycle() {
    let store = Arc::new(OneObjectStore::new("data/file.txt", b"hello world"));
    let (addr, _cache_dir) = start_daemon(store).await;
    let client = ApiClient::new(&addr).unwrap();

    // Register two mounts, out of order.
    for local in ["/tmp/lakemount-itest/m2", "/tmp/lakemount-itest/m1"] {
        client
            .call(RegisterMountRequest {
                mount: mount_at(local),
            })
            .await
            .unwrap();
    }

    let mounts = client.call(ListMountsRequest).await.unwrap();
    let paths: Vec<&str> = mounts.iter().map(|m| m.local_path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["/tmp/lakemount-itest/m1", "/tmp/lakemount-itest/m2"]
    );

    // Remove both; removal of an unknown path is still OK.
    for local in [
        "/tmp/lakemount-itest/m1",
        "/tmp/lakemount-itest/m2",
        "/tmp/lakemount-itest/never",
    ] {
        client
            .call(UnmountRequest {
                path: local.to_string(),
            })
            .await
            .unwrap();
    }
    assert!(client.call(ListMountsRequest).await.unwrap().is_empty());

    // Terminate and watch the port free up.
    client.call(TerminateRequest).await.unwrap();
    let mut stopped = false;
    for _ in 0..50 {
        if !is_server_running(&addr).unwrap() {
            stopped = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(stopped, "daemon still listening after terminate");
}

#[tokio::test]
async fn webdav_get_reads_through_the_cache() {
    let store = Arc::new(OneObjectStore::new("data/file.txt", b"hello world"));
    let (addr, cache_dir) = start_daemon(store.clone()).await;

    let http = reqwest::Client::new();
    let url = format!("http://{addr}/wd/read-only/nonce/repo/main/data/file.txt");

    let first = http.get(&url).send().await.unwrap();
    assert_eq!(first.status(), reqwest::StatusCode::OK);
    assert_eq!(&first.bytes().await.unwrap()[..], b"hello world");

    // A second consumer under a different nonce hits the file cache.
    let url = format!("http://{addr}/wd/read-only/other/repo/main/data/file.txt");
    let second = http.get(&url).send().await.unwrap();
    assert_eq!(&second.bytes().await.unwrap()[..], b"hello world");

    assert_eq!(store.get_calls.load(Ordering::SeqCst), 1);
    assert!(cache_dir.path().join("itest-checksum").exists());

    let missing = format!("http://{addr}/wd/read-only/nonce/repo/main/absent");
    let response = http.get(&missing).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}
