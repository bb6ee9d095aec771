//! Output strategies for emitter backends.
//!
//! Backends see one interface: open a named file, write lines, close it.
//! Where the bytes land is the sink's business.

use std::path::PathBuf;

use tracing::debug;

use modelpub_shared::{ModelPubError, Result};

use crate::archive::ArchiveUnit;
use crate::write_atomic;

/// Receives files produced by an emitter backend.
///
/// Only one file is open at a time. Opening a file while another is still
/// open discards the unclosed one.
pub trait FileSink: Send {
    /// Begin a file. `name` is relative and `/`-separated.
    fn open_file(&mut self, name: &str) -> Result<()>;

    /// Append one line (a newline is added) to the open file.
    fn write_line(&mut self, line: &str) -> Result<()>;

    /// Complete the open file and persist it.
    fn close_file(&mut self) -> Result<()>;

    /// Flush everything and return the paths that now exist on disk.
    fn finish(&mut self) -> Result<Vec<PathBuf>>;

    /// Write a whole file in one call.
    fn write_file(&mut self, name: &str, contents: &str) -> Result<()> {
        self.open_file(name)?;
        for line in contents.lines() {
            self.write_line(line)?;
        }
        self.close_file()
    }
}

/// The file currently being written.
#[derive(Debug, Default)]
struct OpenFile {
    name: String,
    buf: String,
}

fn begin(current: &mut Option<OpenFile>, name: &str) -> Result<()> {
    if name.is_empty() || name.starts_with('/') || name.split('/').any(|s| s == "..") {
        return Err(ModelPubError::validation(format!(
            "invalid output file name '{name}'"
        )));
    }
    if let Some(prev) = current.take() {
        debug!(file = %prev.name, "discarding unclosed file");
    }
    *current = Some(OpenFile {
        name: name.to_string(),
        buf: String::new(),
    });
    Ok(())
}

fn append(current: &mut Option<OpenFile>, line: &str) -> Result<()> {
    let file = current
        .as_mut()
        .ok_or_else(|| ModelPubError::validation("write_line called with no open file"))?;
    file.buf.push_str(line);
    file.buf.push('\n');
    Ok(())
}

fn take(current: &mut Option<OpenFile>) -> Result<OpenFile> {
    current
        .take()
        .ok_or_else(|| ModelPubError::validation("close_file called with no open file"))
}

// ---------------------------------------------------------------------------
// DirectFileSink
// ---------------------------------------------------------------------------

/// Persists each closed file directly under a base directory.
#[derive(Debug)]
pub struct DirectFileSink {
    dir: PathBuf,
    current: Option<OpenFile>,
    written: Vec<PathBuf>,
}

impl DirectFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            current: None,
            written: Vec::new(),
        }
    }
}

impl FileSink for DirectFileSink {
    fn open_file(&mut self, name: &str) -> Result<()> {
        begin(&mut self.current, name)
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        append(&mut self.current, line)
    }

    fn close_file(&mut self) -> Result<()> {
        let file = take(&mut self.current)?;
        let path = self.dir.join(&file.name);
        write_atomic(&path, file.buf.as_bytes())?;
        if !self.written.contains(&path) {
            self.written.push(path);
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<Vec<PathBuf>> {
        self.current = None;
        Ok(std::mem::take(&mut self.written))
    }
}

// ---------------------------------------------------------------------------
// ArchivingSink
// ---------------------------------------------------------------------------

/// Collects every closed file as an entry of one zip container.
#[derive(Debug)]
pub struct ArchivingSink {
    unit: Option<ArchiveUnit>,
    current: Option<OpenFile>,
}

impl ArchivingSink {
    pub fn new(container: impl Into<PathBuf>) -> Self {
        Self {
            unit: Some(ArchiveUnit::open(container)),
            current: None,
        }
    }

    fn unit(&mut self) -> Result<&mut ArchiveUnit> {
        self.unit
            .as_mut()
            .ok_or_else(|| ModelPubError::Archive("archive already finished".into()))
    }
}

impl FileSink for ArchivingSink {
    fn open_file(&mut self, name: &str) -> Result<()> {
        self.unit()?;
        begin(&mut self.current, name)
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        append(&mut self.current, line)
    }

    fn close_file(&mut self) -> Result<()> {
        let file = take(&mut self.current)?;
        self.unit()?.write(&file.name, file.buf.into_bytes())
    }

    fn finish(&mut self) -> Result<Vec<PathBuf>> {
        self.current = None;
        match self.unit.take() {
            Some(unit) => Ok(unit.finish()?.into_iter().collect()),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;
    use crate::tests::temp_dir;

    #[test]
    fn direct_sink_writes_nested_files() {
        let tmp = temp_dir();
        let mut sink = DirectFileSink::new(&tmp);

        sink.open_file("org/acme/Car.ts").unwrap();
        sink.write_line("export interface ICar {").unwrap();
        sink.write_line("}").unwrap();
        sink.close_file().unwrap();

        let written = sink.finish().unwrap();
        assert_eq!(written, vec![tmp.join("org/acme/Car.ts")]);
        assert_eq!(
            std::fs::read_to_string(&written[0]).unwrap(),
            "export interface ICar {\n}\n"
        );
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn reopening_discards_unclosed_buffer() {
        let tmp = temp_dir();
        let mut sink = DirectFileSink::new(&tmp);

        sink.open_file("a.txt").unwrap();
        sink.write_line("lost").unwrap();
        sink.open_file("b.txt").unwrap();
        sink.write_line("kept").unwrap();
        sink.close_file().unwrap();

        assert!(!tmp.join("a.txt").exists());
        assert_eq!(std::fs::read_to_string(tmp.join("b.txt")).unwrap(), "kept\n");
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn write_without_open_file_fails() {
        let mut sink = DirectFileSink::new(temp_dir());
        assert!(sink.write_line("x").is_err());
        assert!(sink.close_file().is_err());
    }

    #[test]
    fn rejects_escaping_names() {
        let mut sink = DirectFileSink::new(temp_dir());
        assert!(sink.open_file("../outside.txt").is_err());
        assert!(sink.open_file("/abs.txt").is_err());
        assert!(sink.open_file("").is_err());
    }

    #[test]
    fn archiving_sink_collects_entries() {
        let tmp = temp_dir();
        let container = tmp.join("model.jar");
        let mut sink = ArchivingSink::new(&container);

        sink.write_file("org/acme/Car.java", "package org.acme;\nclass Car {}\n")
            .unwrap();
        sink.write_file("org/acme/Owner.java", "package org.acme;\n")
            .unwrap();

        let written = sink.finish().unwrap();
        assert_eq!(written, vec![container.clone()]);

        let mut archive = zip::ZipArchive::new(std::fs::File::open(&container).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
        let mut text = String::new();
        archive
            .by_name("org/acme/Car.java")
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "package org.acme;\nclass Car {}\n");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn archiving_sink_without_entries_creates_nothing() {
        let tmp = temp_dir();
        let container = tmp.join("empty.go.zip");
        let mut sink = ArchivingSink::new(&container);

        assert!(sink.finish().unwrap().is_empty());
        assert!(!container.exists());
        assert!(sink.open_file("late.go").is_err());
        let _ = std::fs::remove_dir_all(&tmp);
    }
}
