//! Incrementally built zip containers.
//!
//! An [`ArchiveUnit`] collects entries for one container file. Every added
//! entry re-serializes the whole container, so the file on disk always holds
//! exactly the entries closed so far.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use modelpub_shared::{ModelPubError, Result};

use crate::write_atomic;

/// One compressed container and the entries written to it so far.
#[derive(Debug)]
pub struct ArchiveUnit {
    path: PathBuf,
    entries: Vec<(String, Vec<u8>)>,
}

impl ArchiveUnit {
    /// Start a container at `path`. Nothing is written until the first entry.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of the entries in write order.
    pub fn entry_names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Append an entry and rewrite the container.
    ///
    /// Writing a name that already exists replaces that entry's contents in
    /// place rather than producing a duplicate.
    #[instrument(skip_all, fields(archive = %self.path.display(), entry = name))]
    pub fn write(&mut self, name: &str, bytes: Vec<u8>) -> Result<()> {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(existing) => existing.1 = bytes,
            None => self.entries.push((name.to_string(), bytes)),
        }
        self.flush()
    }

    /// Complete the container.
    ///
    /// Returns the container path, or `None` when no entry was ever written
    /// (in which case no file exists on disk).
    pub fn finish(self) -> Result<Option<PathBuf>> {
        if self.entries.is_empty() {
            debug!(archive = %self.path.display(), "empty archive, nothing written");
            return Ok(None);
        }
        Ok(Some(self.path))
    }

    fn flush(&self) -> Result<()> {
        let bytes = self.serialize().map_err(|e| {
            ModelPubError::Archive(format!("{}: {e}", self.path.display()))
        })?;
        write_atomic(&self.path, &bytes)
    }

    fn serialize(&self) -> std::result::Result<Vec<u8>, zip::result::ZipError> {
        // Fixed timestamps keep repeated publishes byte-identical.
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, bytes) in &self.entries {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(bytes)?;
        }
        Ok(writer.finish()?.into_inner())
    }
}
