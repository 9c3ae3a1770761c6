//! Daemon discovery and self-spawning.
//!
//! Liveness is probed by attempting to bind the daemon's fixed address: a
//! clean bind (immediately released) means nobody is there, and an
//! address-in-use failure means the daemon holds the port. There is no PID
//! file.

use std::io;
use std::net::TcpListener;
use std::process::{Command, Stdio};

use tracing::debug;

/// Probe whether a daemon is listening on `addr`.
pub fn is_server_running(addr: &str) -> io::Result<bool> {
    match TcpListener::bind(addr) {
        Ok(listener) => {
            drop(listener);
            Ok(false)
        }
        Err(err) if is_addr_in_use(&err) => Ok(true),
        Err(err) => Err(err),
    }
}

fn is_addr_in_use(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::AddrInUse {
        return true;
    }
    // Winsock reports WSAEADDRINUSE, which not every toolchain maps onto
    // ErrorKind::AddrInUse.
    #[cfg(windows)]
    {
        const WSAEADDRINUSE: i32 = 10048;
        if err.raw_os_error() == Some(WSAEADDRINUSE) {
            return true;
        }
    }
    false
}

/// Re-execute the current binary with `args`, detached from our stdio, and
/// release the child so it outlives this process. Returns the child PID.
pub fn daemonize(args: &[&str]) -> io::Result<u32> {
    let exe = std::env::current_exe()?;
    let child = Command::new(exe)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    let pid = child.id();
    debug!(pid, ?args, "spawned background process");
    // Dropping the handle releases the child; nobody waits on it.
    drop(child);
    Ok(pid)
}
