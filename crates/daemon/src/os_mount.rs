//! OS mount helper subprocesses.
//!
//! The actual kernel mount is performed by the platform's WebDAV mount
//! tool, invoked as an opaque subprocess. On failure the helper's combined
//! stdout and stderr is attached to the error, because that output is
//! usually the only diagnostic the tool gives.

use std::path::Path;
use std::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum MountHelperError {
    #[error("mount command failed: \"{command}\":\n{output}")]
    CommandFailed { command: String, output: String },
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
}

fn exec_mount_command(name: &str, args: &[&str]) -> Result<(), MountHelperError> {
    let command = format!("{} {}", name, args.join(" "));
    let output = Command::new(name)
        .args(args)
        .output()
        .map_err(|source| MountHelperError::Spawn {
            command: command.clone(),
            source,
        })?;
    if !output.status.success() {
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        return Err(MountHelperError::CommandFailed {
            command,
            output: combined,
        });
    }
    Ok(())
}

#[cfg(target_os = "macos")]
pub fn mount(mount_url: &str, location: &Path) -> Result<(), MountHelperError> {
    exec_mount_command("mount_webdav", &["-S", mount_url, &location.to_string_lossy()])
}

#[cfg(target_os = "macos")]
pub fn umount(location: &Path) -> Result<(), MountHelperError> {
    exec_mount_command("umount", &[&location.to_string_lossy()])
}

#[cfg(target_os = "linux")]
pub fn mount(mount_url: &str, location: &Path) -> Result<(), MountHelperError> {
    exec_mount_command("mount.davfs", &[mount_url, &location.to_string_lossy()])
}

#[cfg(target_os = "linux")]
pub fn umount(location: &Path) -> Result<(), MountHelperError> {
    exec_mount_command("umount", &[&location.to_string_lossy()])
}

#[cfg(windows)]
pub fn mount(mount_url: &str, location: &Path) -> Result<(), MountHelperError> {
    exec_mount_command("net", &["use", &location.to_string_lossy(), mount_url])
}

#[cfg(windows)]
pub fn umount(location: &Path) -> Result<(), MountHelperError> {
    exec_mount_command("net", &["use", &location.to_string_lossy(), "/delete"])
}
