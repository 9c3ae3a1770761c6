//! The `umount` operation: detach the kernel mount, drop it from the
//! registry, and terminate the daemon when it was the last one.

use std::path;

use async_trait::async_trait;
use clap::Args;

use crate::cli::op::{Op, OpContext};
use crate::os_mount::{self, MountHelperError};
use crate::process;
use crate::server::api::{ApiClient, ApiError, ListMountsRequest, TerminateRequest, UnmountRequest};

#[derive(Args, Debug, Clone)]
pub struct Umount {
    /// Local mount point to unmount
    pub local: String,
}

#[derive(Debug, thiserror::Error)]
pub enum UmountError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    MountHelper(#[from] MountHelperError),
}

#[async_trait]
impl Op for Umount {
    type Error = UmountError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let absolute = path::absolute(&self.local)?;
        if !process::is_server_running(&ctx.server_addr)? {
            // No daemon, nothing mounted through us.
            return Ok(String::new());
        }

        os_mount::umount(&absolute)?;

        let client = ApiClient::new(&ctx.server_addr)?;
        client
            .call(UnmountRequest {
                path: absolute.to_string_lossy().into_owned(),
            })
            .await?;

        if client.call(ListMountsRequest).await?.is_empty() {
            // Last one out turns off the lights.
            client.call(TerminateRequest).await?;
            return Ok(format!(
                "unmounted {}; mount server terminated",
                absolute.display()
            ));
        }
        Ok(format!("unmounted {}", absolute.display()))
    }
}
