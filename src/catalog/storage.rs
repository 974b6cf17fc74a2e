//! File storage for Bookshelf.
//!
//! Uploaded files live directly in the upload directory under their original
//! names:
//! ```text
//! {base_path}/
//! ├── metadata.json
//! ├── Some Book.epub
//! └── notes.pdf
//! ```
//!
//! Names come from clients, so every operation validates the name before it
//! is joined onto the base path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::MAX_NAME_LENGTH;
use crate::{BookshelfError, Result};

/// File storage service for the upload directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Upload directory.
    base_path: PathBuf,
}

impl FileStore {
    /// Create a new FileStore rooted at the given directory.
    ///
    /// The directory will be created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the base path of this storage.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Check that a name can be stored directly under the upload directory.
    ///
    /// Rejects empty names, `.` and `..`, path separators, control characters
    /// and names longer than [`MAX_NAME_LENGTH`] bytes.
    pub fn validate_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(BookshelfError::InvalidName("empty name".to_string()));
        }

        if name == "." || name == ".." {
            return Err(BookshelfError::InvalidName(name.to_string()));
        }

        if name.len() > MAX_NAME_LENGTH {
            return Err(BookshelfError::InvalidName(format!(
                "name longer than {MAX_NAME_LENGTH} bytes"
            )));
        }

        if name.contains('/') || name.contains('\\') || name.chars().any(|c| c.is_control()) {
            return Err(BookshelfError::InvalidName(name.escape_debug().to_string()));
        }

        Ok(())
    }

    /// Resolve a stored name to its path under the upload directory.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        Self::validate_name(name)?;
        Ok(self.base_path.join(name))
    }

    /// Write content under the given name, replacing any existing file.
    pub fn write(&self, name: &str, content: &[u8]) -> Result<()> {
        let file_path = self.resolve(name)?;

        // The directory may have been removed since startup.
        fs::create_dir_all(&self.base_path)?;
        fs::write(&file_path, content)?;

        Ok(())
    }

    /// Read the content stored under the given name.
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let file_path = self.resolve(name)?;

        match fs::read(&file_path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(BookshelfError::NotFound(format!("File {name}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a file.
    ///
    /// Returns `true` if the file was deleted, `false` if it didn't exist.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let file_path = self.resolve(name)?;

        match fs::remove_file(&file_path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Check if a file exists. Invalid names never exist.
    pub fn exists(&self, name: &str) -> bool {
        self.resolve(name).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Size in bytes of a stored file.
    pub fn file_size(&self, name: &str) -> Result<u64> {
        match fs::metadata(self.resolve(name)?) {
            Ok(meta) if meta.is_file() => Ok(meta.len()),
            Ok(_) => Err(BookshelfError::NotFound(format!("File {name}"))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(BookshelfError::NotFound(format!("File {name}")))
            }
            Err(e) => Err(e.into()),
        }
    }
}
