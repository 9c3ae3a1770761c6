//! The declarative mount manifest.
//!
//! A [`MountFile`] is the portable YAML document produced by
//! `lakemount mount --freeze` and consumed by `lakemount mount --from`.
//! Local paths in the manifest are relative to the manifest's own location
//! so the file can be committed and replayed from a checkout elsewhere.

use serde::{Deserialize, Serialize};

use crate::uri::{MountMode, RemotePath};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountFileEntry {
    /// Slash-normalized path, relative to the manifest location.
    pub local_path: String,
    pub remote_path: RemotePath,
    /// Pinned commit, when the mount was frozen against one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<String>,
    pub mode: MountMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountFile {
    pub mounts: Vec<MountFileEntry>,
}

impl MountFile {
    pub fn parse(data: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(data)
    }

    pub fn render(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = "\
mounts:
- local_path: data/raw
  remote_path: lakefs://repo/main/raw
  mode: read-only
- local_path: data/curated
  remote_path: lakefs://repo/prod/curated
  head: abc123
  mode: read-only
";

    #[test]
    fn parse_manifest() {
        let file = MountFile::parse(MANIFEST).unwrap();
        assert_eq!(file.mounts.len(), 2);
        assert_eq!(file.mounts[0].local_path, "data/raw");
        assert_eq!(
            file.mounts[0].remote_path,
            RemotePath::new("repo", "main", "raw")
        );
        assert_eq!(file.mounts[0].head, None);
        assert_eq!(file.mounts[1].head.as_deref(), Some("abc123"));
        assert_eq!(file.mounts[1].mode, MountMode::ReadOnly);
    }

    #[test]
    fn render_round_trip() {
        let file = MountFile::parse(MANIFEST).unwrap();
        let rendered = file.render().unwrap();
        assert_eq!(MountFile::parse(&rendered).unwrap(), file);
    }

    #[test]
    fn head_omitted_when_absent() {
        let file = MountFile {
            mounts: vec![MountFileEntry {
                local_path: "m".to_string(),
                remote_path: RemotePath::new("r", "main", ""),
                head: None,
                mode: MountMode::ReadOnly,
            }],
        };
        let rendered = file.render().unwrap();
        assert!(!rendered.contains("head"));
        assert!(rendered.contains("remote_path: lakefs://r/main"));
    }
}
