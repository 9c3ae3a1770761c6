//! The `mount` operation and its flag-selected variants: a regular mount,
//! the foreground daemon (`--server`, used internally by the self-spawn),
//! `--freeze`, `--from <file>`, and `--config key=value`.

use std::fs;
use std::path::{self, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::Args;
use common::{MountFile, MountFileEntry, MountMode, RemotePath, UriError};

use crate::cli::op::{Op, OpContext};
use crate::config::{self, Config, ConfigError};
use crate::os_mount::{self, MountHelperError};
use crate::process;
use crate::server::api::{ApiClient, ApiError, ListMountsRequest, RegisterMountRequest};
use crate::server::{self, MountInfo, ServerError};
use crate::upstream::{UpstreamClient, UpstreamError};

const SPAWN_ATTEMPTS: u32 = 3;

#[derive(Args, Debug, Clone)]
pub struct Mount {
    /// Remote path to mount, `lakefs://repository/ref/path`
    pub remote: Option<String>,

    /// Local directory to mount onto
    pub local: Option<String>,

    /// Run the mount server in the foreground
    #[arg(long, hide = true, conflicts_with_all = ["freeze", "from", "config"])]
    pub server: bool,

    /// Print currently mounted paths as a mount file
    #[arg(long, conflicts_with_all = ["from", "config"])]
    pub freeze: bool,

    /// Mount paths as listed in a file
    #[arg(long, value_name = "FILE", conflicts_with = "config")]
    pub from: Option<PathBuf>,

    /// Set a mount configuration parameter, "key=value"
    #[arg(long, value_name = "KEY=VALUE")]
    pub config: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum MountError {
    #[error("{0}")]
    Usage(&'static str),
    #[error(transparent)]
    Uri(#[from] UriError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    MountHelper(#[from] MountHelperError),
    #[error(transparent)]
    Server(#[from] ServerError),
    #[error("could not spin up local mount server after {attempts} attempts")]
    ServerSpawn { attempts: u32 },
    #[error("invalid mount file: {0}")]
    Manifest(#[from] serde_yaml::Error),
    #[error("upstream client: {0}")]
    Upstream(#[from] UpstreamError),
}

#[async_trait]
impl Op for Mount {
    type Error = MountError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let flag_variant =
            self.server || self.freeze || self.from.is_some() || self.config.is_some();
        if flag_variant && (self.remote.is_some() || self.local.is_some()) {
            return Err(MountError::Usage(
                "mount flags take no positional arguments",
            ));
        }
        if self.server {
            return run_mount_server(ctx).await;
        }
        if self.freeze {
            return run_freeze(ctx).await;
        }
        if let Some(from) = &self.from {
            return run_from(ctx, from).await;
        }
        if let Some(pair) = &self.config {
            return run_config(pair);
        }
        let (remote, local) = match (&self.remote, &self.local) {
            (Some(remote), Some(local)) => (remote, local),
            _ => {
                return Err(MountError::Usage(
                    "mount requires <remote> and <local> arguments",
                ))
            }
        };
        let remote: RemotePath = remote.parse()?;
        mount_one(ctx, &remote, Path::new(local)).await
    }
}

/// Foreground daemon, reached via the hidden `--server` flag.
async fn run_mount_server(ctx: &OpContext) -> Result<String, MountError> {
    let config = Config::from_env()?;
    let store = UpstreamClient::new(&config)?;
    let cache_dir = config::cache_dir();
    fs::create_dir_all(&cache_dir)?;
    server::run_server(&ctx.server_addr, cache_dir, Arc::new(store)).await?;
    Ok(String::new())
}

/// Make sure a daemon is listening, spawning one if necessary. Returns the
/// spawned PID, or `None` when a daemon was already alive.
async fn ensure_server_running(ctx: &OpContext) -> Result<Option<u32>, MountError> {
    if process::is_server_running(&ctx.server_addr)? {
        return Ok(None);
    }
    let pid = process::daemonize(&["mount", "--server"])?;
    for _ in 0..SPAWN_ATTEMPTS {
        if process::is_server_running(&ctx.server_addr)? {
            return Ok(Some(pid));
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    Err(MountError::ServerSpawn {
        attempts: SPAWN_ATTEMPTS,
    })
}

async fn mount_one(ctx: &OpContext, remote: &RemotePath, local: &Path) -> Result<String, MountError> {
    let spawned = ensure_server_running(ctx).await?;
    let mut output = String::new();
    if let Some(pid) = spawned {
        output.push_str(&format!("started mount server with pid {pid}\n"));
    }

    let absolute = path::absolute(local)?;
    if !absolute.is_dir() {
        fs::create_dir_all(&absolute)?;
    }

    let client = ApiClient::new(&ctx.server_addr)?;
    let url = client.webdav_url(MountMode::ReadOnly, remote);
    os_mount::mount(&url, &absolute)?;

    client
        .call(RegisterMountRequest {
            mount: MountInfo {
                remote: remote.clone(),
                local_path: absolute.to_string_lossy().into_owned(),
                mode: MountMode::ReadOnly,
            },
        })
        .await?;

    output.push_str(&format!("mounted {} at {}", remote, absolute.display()));
    Ok(output)
}

async fn run_freeze(ctx: &OpContext) -> Result<String, MountError> {
    if !process::is_server_running(&ctx.server_addr)? {
        return Ok(String::new());
    }
    let client = ApiClient::new(&ctx.server_addr)?;
    let mounts = client.call(ListMountsRequest).await?;
    let cwd = std::env::current_dir()?;
    Ok(freeze_mounts(&mounts, &cwd).render()?)
}

/// Keep only mounts under `cwd`, relativized with forward slashes.
pub(crate) fn freeze_mounts(mounts: &[MountInfo], cwd: &Path) -> MountFile {
    let mut entries = Vec::new();
    for mount in mounts {
        let Ok(relative) = Path::new(&mount.local_path).strip_prefix(cwd) else {
            // Not a sub-path of the working directory.
            continue;
        };
        let local_path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        entries.push(MountFileEntry {
            local_path,
            remote_path: mount.remote.clone(),
            head: None,
            mode: mount.mode,
        });
    }
    MountFile { mounts: entries }
}

/// Replay a mount file. Entries are relative to the manifest's location.
async fn run_from(ctx: &OpContext, from: &Path) -> Result<String, MountError> {
    let data = fs::read_to_string(from)?;
    let mount_file = MountFile::parse(&data)?;
    let base = from.parent().unwrap_or(Path::new("."));
    let mut outputs = Vec::new();
    for entry in &mount_file.mounts {
        let local = base.join(&entry.local_path);
        outputs.push(mount_one(ctx, &entry.remote_path, &local).await?);
    }
    Ok(outputs.join("\n"))
}

fn run_config(pair: &str) -> Result<String, MountError> {
    match pair.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok(format!("config pair: {key} = {value}")),
        _ => Err(MountError::Usage("--config expects \"key=value\"")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mount_at(local: &str) -> MountInfo {
        MountInfo {
            remote: RemotePath::new("repo", "main", "data"),
            local_path: local.to_string(),
            mode: MountMode::ReadOnly,
        }
    }

    #[test]
    fn freeze_relativizes_descendants_and_drops_the_rest() {
        let mounts = vec![
            mount_at("/work/project/data/raw"),
            mount_at("/work/project/m1"),
            mount_at("/elsewhere/m2"),
        ];
        let frozen = freeze_mounts(&mounts, Path::new("/work/project"));

        let paths: Vec<&str> = frozen
            .mounts
            .iter()
            .map(|e| e.local_path.as_str())
            .collect();
        assert_eq!(paths, vec!["data/raw", "m1"]);
        assert!(frozen.mounts.iter().all(|e| e.head.is_none()));
    }

    #[test]
    fn freeze_of_unrelated_tree_is_empty() {
        let frozen = freeze_mounts(&[mount_at("/elsewhere/m")], Path::new("/work"));
        assert!(frozen.mounts.is_empty());
    }

    #[test]
    fn config_pairs() {
        assert_eq!(
            run_config("prefetch=on").unwrap(),
            "config pair: prefetch = on"
        );
        assert!(run_config("not-a-pair").is_err());
        assert!(run_config("=value").is_err());
    }
}
