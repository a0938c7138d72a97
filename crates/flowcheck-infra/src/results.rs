//! Check-result stores.
//!
//! - [`InMemoryResultStore`]: shared in-process buffer.
//! - [`JsonlResultStore`]: one JSON object per line in a file. Records are
//!   appended; `patch_last` writes the patched file to a temporary sibling
//!   and renames it over the original, so a crash leaves either the old or
//!   the new contents.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use flowcheck_core::ResultStore;
use flowcheck_types::{CheckRecord, StoreError};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

/// In-memory store. Clones share the same records.
#[derive(Debug, Default, Clone)]
pub struct InMemoryResultStore {
    records: Arc<Mutex<Vec<CheckRecord>>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultStore for InMemoryResultStore {
    fn record(&mut self, record: CheckRecord) -> Result<(), StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .push(record);
        Ok(())
    }

    fn patch_last(&mut self, metadata: &Map<String, Value>) -> Result<bool, StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        match records.last_mut() {
            Some(last) => {
                last.apply_patch(metadata);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn records(&self) -> Result<Vec<CheckRecord>, StoreError> {
        Ok(self.records.lock().map_err(|_| StoreError::Poisoned)?.clone())
    }
}

/// JSON Lines file store.
#[derive(Debug, Clone)]
pub struct JsonlResultStore {
    path: PathBuf,
}

impl JsonlResultStore {
    /// Open (creating if needed) the file at `path`. Existing records are kept.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultStore for JsonlResultStore {
    fn record(&mut self, record: CheckRecord) -> Result<(), StoreError> {
        let line = serde_json::to_string(&record)?;
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    fn patch_last(&mut self, metadata: &Map<String, Value>) -> Result<bool, StoreError> {
        let content = fs::read_to_string(&self.path)?;
        let mut lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
        let Some(last) = lines.pop() else {
            return Ok(false);
        };

        let mut record: CheckRecord = serde_json::from_str(last)?;
        record.apply_patch(metadata);
        let patched = serde_json::to_string(&record)?;

        let mut rewritten = String::with_capacity(content.len() + patched.len());
        for line in lines {
            rewritten.push_str(line);
            rewritten.push('\n');
        }
        rewritten.push_str(&patched);
        rewritten.push('\n');

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(rewritten.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|err| StoreError::Io(err.error))?;
        Ok(true)
    }

    fn records(&self) -> Result<Vec<CheckRecord>, StoreError> {
        let content = fs::read_to_string(&self.path)?;
        content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(StoreError::from))
            .collect()
    }
}
