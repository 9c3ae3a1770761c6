//! The `lakefs://{repository}/{ref}/{path}` coordinate.
//!
//! A [`RemotePath`] names a node in the remote namespace: a repository, a
//! symbolic reference (branch, tag, or commit), and a slash-delimited path
//! that never starts with a slash and may be empty (the root of the ref).
//! The string form round-trips through [`std::fmt::Display`] and
//! [`std::str::FromStr`], and that is also how it serializes in JSON and
//! YAML documents.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// URI scheme prefix for remote coordinates.
pub const SCHEME: &str = "lakefs://";

/// A `(repository, reference, path)` coordinate in the remote namespace.
///
/// Equality is by component tuple; no lexical normalization is applied
/// beyond what parsing implies, so `lakefs://r/main/a/` and
/// `lakefs://r/main/a` are distinct coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemotePath {
    pub repository: String,
    pub reference: String,
    pub path: String,
}

impl RemotePath {
    pub fn new(
        repository: impl Into<String>,
        reference: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            repository: repository.into(),
            reference: reference.into(),
            path: path.into(),
        }
    }

    /// Last path segment, or the empty string for the ref root.
    pub fn basename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UriError {
    #[error("remote path must start with {SCHEME}")]
    MissingScheme,
    #[error("remote path is missing a repository")]
    MissingRepository,
    #[error("remote path is missing a reference")]
    MissingReference,
}

impl FromStr for RemotePath {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix(SCHEME).ok_or(UriError::MissingScheme)?;
        let mut parts = rest.splitn(3, '/');
        let repository = match parts.next() {
            Some(r) if !r.is_empty() => r,
            _ => return Err(UriError::MissingRepository),
        };
        let reference = match parts.next() {
            Some(r) if !r.is_empty() => r,
            _ => return Err(UriError::MissingReference),
        };
        let path = parts.next().unwrap_or_default();
        Ok(RemotePath::new(repository, reference, path))
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{SCHEME}{}/{}", self.repository, self.reference)
        } else {
            write!(
                f,
                "{SCHEME}{}/{}/{}",
                self.repository, self.reference, self.path
            )
        }
    }
}

impl Serialize for RemotePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RemotePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// How a mount exposes the remote tree. Only read-only mounts exist today,
/// but the mode participates in the WebDAV URL layout and the control API
/// wire format, so it is a named type rather than a bare string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MountMode {
    ReadOnly,
}

impl fmt::Display for MountMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MountMode::ReadOnly => f.write_str("read-only"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_coordinate() {
        let u: RemotePath = "lakefs://repo/main/data/file.parquet".parse().unwrap();
        assert_eq!(u.repository, "repo");
        assert_eq!(u.reference, "main");
        assert_eq!(u.path, "data/file.parquet");
    }

    #[test]
    fn parse_ref_root() {
        let u: RemotePath = "lakefs://repo/main".parse().unwrap();
        assert_eq!(u.path, "");
        let u: RemotePath = "lakefs://repo/main/".parse().unwrap();
        assert_eq!(u.path, "");
    }

    #[test]
    fn parse_preserves_trailing_slash_in_path() {
        let u: RemotePath = "lakefs://repo/main/dir/".parse().unwrap();
        assert_eq!(u.path, "dir/");
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            "s3://bucket/key".parse::<RemotePath>(),
            Err(UriError::MissingScheme)
        );
        assert_eq!(
            "lakefs://".parse::<RemotePath>(),
            Err(UriError::MissingRepository)
        );
        assert_eq!(
            "lakefs://repo".parse::<RemotePath>(),
            Err(UriError::MissingReference)
        );
        assert_eq!(
            "lakefs://repo/".parse::<RemotePath>(),
            Err(UriError::MissingReference)
        );
    }

    #[test]
    fn display_round_trip() {
        for s in [
            "lakefs://repo/main",
            "lakefs://repo/main/a/b/c",
            "lakefs://repo/v1.2/dir/",
        ] {
            let u: RemotePath = s.parse().unwrap();
            assert_eq!(u.to_string(), s);
            assert_eq!(u.to_string().parse::<RemotePath>().unwrap(), u);
        }
    }

    #[test]
    fn serializes_as_string() {
        let u = RemotePath::new("repo", "main", "a/b");
        assert_eq!(
            serde_json::to_string(&u).unwrap(),
            "\"lakefs://repo/main/a/b\""
        );
        let back: RemotePath = serde_json::from_str("\"lakefs://repo/main/a/b\"").unwrap();
        assert_eq!(back, u);
    }

    #[test]
    fn basename() {
        assert_eq!(RemotePath::new("r", "m", "a/b/c.txt").basename(), "c.txt");
        assert_eq!(RemotePath::new("r", "m", "top").basename(), "top");
        assert_eq!(RemotePath::new("r", "m", "").basename(), "");
    }

    #[test]
    fn mode_wire_format() {
        assert_eq!(
            serde_json::to_string(&MountMode::ReadOnly).unwrap(),
            "\"read-only\""
        );
        assert_eq!(MountMode::ReadOnly.to_string(), "read-only");
    }
}
