//! The daemon process: one loopback listener serving both the WebDAV tree
//! and the JSON control API.
//!
//! Requests whose path starts with `/wd/read-only` go to the `dav_server`
//! handler; everything else goes to the axum control router. Shutdown is
//! triggered by SIGINT/SIGTERM or by `POST /terminate`, all of which break
//! the accept loop.

pub mod api;
mod registry;

use std::convert::Infallible;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::Router;
use dav_server::memls::MemLs;
use dav_server::DavHandler;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::ServiceExt;
use tracing::{debug, info, warn};

use crate::dav::RemoteFs;
use crate::upstream::ObjectStore;

pub use registry::{MountInfo, MountRegistry};

/// URL prefix the WebDAV handler is mounted under.
pub const READ_ONLY_PREFIX: &str = "/wd/read-only";

/// Shared state behind the control API.
#[derive(Clone)]
pub struct ServerState {
    inner: Arc<StateInner>,
}

struct StateInner {
    registry: MountRegistry,
    shutdown: mpsc::Sender<()>,
}

impl ServerState {
    pub(crate) fn new(shutdown: mpsc::Sender<()>) -> Self {
        Self {
            inner: Arc::new(StateInner {
                registry: MountRegistry::new(),
                shutdown,
            }),
        }
    }

    pub fn registry(&self) -> &MountRegistry {
        &self.inner.registry
    }

    /// Request daemon shutdown. Losing the race against a concurrent
    /// terminate is fine, hence the ignored send failure.
    pub fn terminate(&self) {
        let _ = self.inner.shutdown.try_send(());
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Run the mount daemon until a shutdown signal arrives.
///
/// Binding `addr` doubles as the singleton lock: a second daemon fails here
/// with `AddrInUse` and the CLI side interprets exactly that as "already
/// running".
pub async fn run_server(
    addr: &str,
    cache_dir: PathBuf,
    store: Arc<dyn ObjectStore>,
) -> Result<(), ServerError> {
    let fs = RemoteFs::new(store, cache_dir, true)?;
    let dav_handler = DavHandler::builder()
        .strip_prefix(READ_ONLY_PREFIX)
        .filesystem(Box::new(fs))
        .locksystem(MemLs::new())
        .build_handler();

    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let state = ServerState::new(shutdown_tx);
    let router = api::router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "mount server listening");
    serve(listener, dav_handler, router, shutdown_rx).await
}

async fn serve(
    listener: TcpListener,
    dav_handler: DavHandler,
    router: Router,
    shutdown_rx: mpsc::Receiver<()>,
) -> Result<(), ServerError> {
    let shutdown = shutdown_signal(shutdown_rx);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, remote_addr) = accepted?;
                debug!(%remote_addr, "connection accepted");
                let dav_handler = dav_handler.clone();
                let router = router.clone();
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);
                    let service = service_fn(move |req: Request<Incoming>| {
                        let dav_handler = dav_handler.clone();
                        let router = router.clone();
                        async move { route_request(dav_handler, router, req).await }
                    });
                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        debug!(error = %err, "connection error");
                    }
                });
            }
            _ = &mut shutdown => {
                info!("mount server shutting down");
                break;
            }
        }
    }
    Ok(())
}

async fn route_request(
    dav_handler: DavHandler,
    router: Router,
    req: Request<Incoming>,
) -> Result<Response<Body>, Infallible> {
    if req.uri().path().starts_with(READ_ONLY_PREFIX) {
        let response = dav_handler.handle(req).await;
        return Ok(response.map(Body::new));
    }
    router.oneshot(req).await
}

#[cfg(unix)]
async fn shutdown_signal(mut terminate_rx: mpsc::Receiver<()>) {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(err) => {
            warn!(error = %err, "failed to install SIGTERM handler");
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate_rx.recv() => {}
            }
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
        _ = terminate_rx.recv() => {}
    }
}

#[cfg(not(unix))]
async fn shutdown_signal(mut terminate_rx: mpsc::Receiver<()>) {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminate_rx.recv() => {}
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;

    pub(crate) fn test_state() -> (ServerState, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel(1);
        (ServerState::new(tx), rx)
    }
}
