use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

pub const SLOT_DIR: &str = ".clienthub";
pub const SLOT_FILE: &str = "tasks.json";

#[derive(thiserror::Error, Debug)]
pub enum SlotError {
    #[error("reading {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("writing {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("storage quota exceeded")]
    QuotaExceeded,
}

/// A single named key-value slot holding the serialized task array.
/// Read once at startup and overwritten wholesale on every change.
pub trait Slot {
    fn read(&self) -> Result<Option<String>, SlotError>;
    fn write(&mut self, contents: &str) -> Result<(), SlotError>;
    fn describe(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSlot { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Slot for FileSlot {
    fn read(&self) -> Result<Option<String>, SlotError> {
        match fs::read_to_string(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SlotError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write(&mut self, contents: &str) -> Result<(), SlotError> {
        debug!(file = %self.path.display(), bytes = contents.len(), "writing slot atomically");
        let wrap = |source: io::Error| SlotError::Write {
            path: self.path.clone(),
            source,
        };
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(wrap)?;
        let mut temp = NamedTempFile::new_in(dir).map_err(wrap)?;
        temp.write_all(contents.as_bytes()).map_err(wrap)?;
        temp.flush().map_err(wrap)?;
        temp.persist(&self.path).map_err(|err| wrap(err.error))?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory slot. `fail_writes` simulates a full storage quota.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    pub contents: Option<String>,
    pub fail_writes: bool,
    pub writes: usize,
}

impl MemorySlot {
    pub fn new() -> Self {
        MemorySlot::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        MemorySlot {
            contents: Some(contents.into()),
            ..MemorySlot::default()
        }
    }
}

impl Slot for MemorySlot {
    fn read(&self) -> Result<Option<String>, SlotError> {
        Ok(self.contents.clone())
    }

    fn write(&mut self, contents: &str) -> Result<(), SlotError> {
        if self.fail_writes {
            return Err(SlotError::QuotaExceeded);
        }
        self.contents = Some(contents.to_string());
        self.writes += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotScope {
    Project,
    Global,
    Explicit,
}

impl SlotScope {
    pub fn label(self) -> &'static str {
        match self {
            SlotScope::Project => "project",
            SlotScope::Global => "global",
            SlotScope::Explicit => "explicit",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SlotLocation {
    pub path: PathBuf,
    pub scope: SlotScope,
}

impl SlotLocation {
    pub fn explicit(path: impl Into<PathBuf>) -> Self {
        SlotLocation {
            path: path.into(),
            scope: SlotScope::Explicit,
        }
    }

    pub fn slot(&self) -> FileSlot {
        FileSlot::new(self.path.clone())
    }
}

/// Path of a project slot rooted at `dir`, creating the `.clienthub`
/// directory if needed.
pub fn project_slot_location(dir: &Path) -> Result<SlotLocation> {
    let slot_dir = dir.join(SLOT_DIR);
    fs::create_dir_all(&slot_dir).context("failed to create .clienthub directory")?;
    Ok(SlotLocation {
        path: slot_dir.join(SLOT_FILE),
        scope: SlotScope::Project,
    })
}

pub fn locate_slot(start: &Path) -> Result<SlotLocation> {
    if let Some(project_path) = find_project_slot(start) {
        return Ok(SlotLocation {
            path: project_path,
            scope: SlotScope::Project,
        });
    }
    let global_path = global_slot_path()?;
    Ok(SlotLocation {
        path: global_path,
        scope: SlotScope::Global,
    })
}

fn find_project_slot(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(SLOT_DIR).join(SLOT_FILE);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

pub fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "clienthub").context("locating data directory")
}

fn global_slot_path() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().join(SLOT_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_reads_as_empty_slot() {
        let dir = tempdir().expect("tempdir");
        let slot = FileSlot::new(dir.path().join("nope.json"));
        assert!(slot.read().expect("read").is_none());
    }

    #[test]
    fn file_slot_overwrites_wholesale() {
        let dir = tempdir().expect("tempdir");
        let mut slot = FileSlot::new(dir.path().join("nested/tasks.json"));
        slot.write("[1,2,3]").expect("first write");
        slot.write("[]").expect("second write");
        assert_eq!(slot.read().expect("read").as_deref(), Some("[]"));
    }

    #[test]
    fn project_slot_found_from_subdirectory() {
        let dir = tempdir().expect("tempdir");
        let location = project_slot_location(dir.path()).expect("location");
        fs::write(&location.path, "[]").expect("seed file");
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).expect("nested");

        let found = locate_slot(&nested).expect("locate");
        assert_eq!(found.scope, SlotScope::Project);
        assert_eq!(found.path, location.path);
    }

    #[test]
    fn memory_slot_can_refuse_writes() {
        let mut slot = MemorySlot::with_contents("[]");
        slot.fail_writes = true;
        assert!(matches!(slot.write("[1]"), Err(SlotError::QuotaExceeded)));
        assert_eq!(slot.contents.as_deref(), Some("[]"));
        assert_eq!(slot.writes, 0);
    }
}
