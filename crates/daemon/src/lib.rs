//! The lakemount daemon and CLI.
//!
//! A single local process serves remote `(repository, ref, path)` trees as
//! read-only WebDAV on `127.0.0.1:6363`, alongside a small JSON control API
//! for registering and removing active mounts. CLI invocations spawn the
//! daemon when it is absent, join it when it is alive, and terminate it when
//! the last mount is removed.

pub mod cache;
pub mod cli;
pub mod config;
pub mod dav;
pub mod os_mount;
pub mod process;
pub mod server;
pub mod upstream;

pub use config::{Config, MOUNT_SERVER_ADDR};
pub use server::{MountInfo, MountRegistry};
pub use upstream::{ObjectStore, UpstreamClient};
