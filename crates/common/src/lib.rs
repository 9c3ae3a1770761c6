//! Shared data model for the lakemount daemon and CLI.
//!
//! Everything in this crate is plain data: the `lakefs://` coordinate that
//! names a node in the remote namespace, the mount mode vocabulary, and the
//! YAML mount-manifest format. No I/O, no async.

pub mod fstab;
pub mod uri;

pub use fstab::{MountFile, MountFileEntry};
pub use uri::{MountMode, RemotePath, UriError};
