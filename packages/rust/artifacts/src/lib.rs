//! Artifact output: file sinks, archive containers, and checksums.
//!
//! Emitter backends never touch the filesystem directly. They write through a
//! [`FileSink`], which either persists each file as it is closed
//! ([`DirectFileSink`]) or collects files into one compressed container
//! ([`ArchivingSink`] backed by an [`ArchiveUnit`]).

pub mod archive;
pub mod sink;

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use modelpub_shared::{ModelPubError, Result};

pub use archive::ArchiveUnit;
pub use sink::{ArchivingSink, DirectFileSink, FileSink};

/// Checksum metadata for one written artifact file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactMeta {
    pub path: PathBuf,
    pub sha256: String,
    pub size_bytes: u64,
}

/// Hex SHA-256 of a byte slice.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Read a written artifact back and compute its checksum.
pub fn describe(path: &Path) -> Result<ArtifactMeta> {
    let bytes = std::fs::read(path).map_err(|e| ModelPubError::io(path, e))?;
    Ok(ArtifactMeta {
        path: path.to_path_buf(),
        sha256: sha256_hex(&bytes),
        size_bytes: bytes.len() as u64,
    })
}

/// Write a file atomically: write to a hidden temp sibling, then rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| ModelPubError::validation(format!("{} has no parent", path.display())))?;
    std::fs::create_dir_all(parent).map_err(|e| ModelPubError::io(parent, e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = parent.join(format!(".{file_name}.tmp"));

    std::fs::write(&temp, bytes).map_err(|e| ModelPubError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| ModelPubError::io(path, e))?;

    debug!(path = %path.display(), size = bytes.len(), "wrote file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mp-artifacts-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn write_atomic_leaves_no_temp_files() {
        let tmp = temp_dir();
        let target = tmp.join("nested/out.json");
        write_atomic(&target, b"{}").unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "{}");
        for entry in std::fs::read_dir(tmp.join("nested")).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().to_string();
            assert!(!name.starts_with('.'), "temp file left behind: {name}");
        }

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn describe_reports_checksum_and_size() {
        let tmp = temp_dir();
        let target = tmp.join("hello.txt");
        std::fs::write(&target, "hello").unwrap();

        let meta = describe(&target).unwrap();
        assert_eq!(meta.size_bytes, 5);
        assert_eq!(
            meta.sha256,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
