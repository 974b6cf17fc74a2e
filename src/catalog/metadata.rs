//! Metadata file for the Bookshelf catalog.
//!
//! The metadata file is a JSON object keyed by record id:
//!
//! ```json
//! {
//!   "20240501_101500_3f9a1c2e": { "name": "book.pdf", "type": "application/pdf", "size": "1024" }
//! }
//! ```
//!
//! The file on disk is the source of truth. Every call re-reads it, and every
//! change is a read-modify-write under the store's mutex followed by an
//! atomic replace (temp file + rename).

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::record::{Record, StoredEntry};
use crate::{BookshelfError, Result};

/// Id → entry map as stored in the metadata file.
pub type Metadata = BTreeMap<String, StoredEntry>;

/// JSON-file-backed store of catalog records.
#[derive(Debug)]
pub struct MetadataStore {
    /// Path of the metadata file.
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl MetadataStore {
    /// Create a store for the metadata file at `path`.
    ///
    /// Nothing is read or written until the first call.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the metadata file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all entries.
    ///
    /// A missing file is created empty. A corrupt file is an error rather
    /// than an empty map, so that a following save cannot wipe it.
    pub fn load(&self) -> Result<Metadata> {
        let _guard = self.guard();
        self.read_or_init()
    }

    /// Merge `entries` into the file. New entries win over existing ids.
    pub fn save(&self, entries: &Metadata) -> Result<()> {
        let _guard = self.guard();

        let mut merged = self.read_or_init()?;
        merged.extend(entries.iter().map(|(id, e)| (id.clone(), e.clone())));

        self.write_all(&merged)
    }

    /// Insert or replace a single entry.
    pub fn put(&self, id: &str, entry: StoredEntry) -> Result<()> {
        let mut entries = Metadata::new();
        entries.insert(id.to_string(), entry);
        self.save(&entries)
    }

    /// Remove an entry.
    ///
    /// Returns `false` if the id was not present; the file is then left untouched.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let _guard = self.guard();

        let mut entries = self.read_or_init()?;
        if entries.remove(id).is_none() {
            return Ok(false);
        }

        self.write_all(&entries)?;
        Ok(true)
    }

    /// Look up a record by id.
    pub fn get(&self, id: &str) -> Result<Record> {
        let mut entries = self.load()?;
        entries
            .remove(id)
            .map(|entry| Record::from_entry(id, entry))
            .ok_or_else(|| BookshelfError::NotFound(format!("Record {id}")))
    }

    /// All records, ordered by id.
    pub fn list(&self) -> Result<Vec<Record>> {
        Ok(self
            .load()?
            .into_iter()
            .map(|(id, entry)| Record::from_entry(id, entry))
            .collect())
    }

    /// The metadata file content as stored on disk.
    pub fn raw(&self) -> Result<String> {
        let _guard = self.guard();
        self.read_or_init()?;
        Ok(fs::read_to_string(&self.path)?)
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The guarded data is `()`, so a poisoned lock carries no broken state.
        self.lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read_or_init(&self) -> Result<Metadata> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let empty = Metadata::new();
                self.write_all(&empty)?;
                tracing::info!(path = %self.path.display(), "Created empty metadata file");
                Ok(empty)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &Metadata) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_vec_pretty(entries)?;
        let temp_path = self.temp_path();

        fs::write(&temp_path, json)?;
        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        Ok(())
    }

    /// Whether `name` is one of the files this store writes next to the
    /// metadata file (the file itself and its temp file).
    pub fn owns_file_name(&self, name: &str) -> bool {
        [self.path.clone(), self.temp_path()]
            .iter()
            .any(|p| p.file_name().is_some_and(|n| n == name))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
