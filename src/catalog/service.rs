//! Catalog service for Bookshelf.
//!
//! Ties the [`FileStore`] and the [`MetadataStore`] together. An upload goes
//! through these steps, stopping at the first failure:
//!
//! 1. reject empty content
//! 2. validate the filename
//! 3. check for a duplicate among the known records
//! 4. write the bytes
//! 5. generate an id and record the entry in the metadata file

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use super::metadata::MetadataStore;
use super::record::{generate_id, Record};
use super::storage::FileStore;
use super::DEFAULT_CONTENT_TYPE;
use crate::config::FilesConfig;
use crate::{BookshelfError, Result};

/// A file received from a client.
#[derive(Debug, Clone)]
pub struct NewUpload {
    /// Original filename.
    pub name: String,
    /// Content type declared by the client.
    pub content_type: Option<String>,
    /// File content.
    pub content: Vec<u8>,
}

impl NewUpload {
    /// Create a new upload without a declared content type.
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            content: content.into(),
        }
    }

    /// Set the declared content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Size of the content in bytes.
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// The declared content type, else a guess from the extension.
    fn resolved_content_type(&self) -> String {
        self.content_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                mime_guess::from_path(&self.name)
                    .first()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
            })
    }
}

/// An existing record that blocks an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate {
    /// The record already holding the name.
    pub existing: Record,
    /// Whether the rejected upload had a different size.
    pub size_mismatch: bool,
}

/// Result of an upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The file was written and recorded.
    Stored(Record),
    /// A file with the same name is already in the catalog; nothing was written.
    Duplicate(Duplicate),
}

/// A record together with its file content.
#[derive(Debug, Clone)]
pub struct Download {
    /// The record.
    pub record: Record,
    /// File content.
    pub content: Vec<u8>,
}

/// Find the record that makes an upload a duplicate.
///
/// Any record with the same name counts, whatever its size.
pub fn find_duplicate(records: &[Record], name: &str, size: u64) -> Option<Duplicate> {
    records
        .iter()
        .find(|r| r.name == name)
        .map(|existing| Duplicate {
            existing: existing.clone(),
            size_mismatch: existing.size != size,
        })
}

/// The book catalog of one upload directory.
#[derive(Debug)]
pub struct Catalog {
    files: FileStore,
    metadata: MetadataStore,
    /// Held for a whole upload or delete so the duplicate check and the
    /// metadata update see the same state.
    lock: Mutex<()>,
}

impl Catalog {
    /// Open the catalog in `upload_dir`, creating the directory if needed.
    pub fn new(upload_dir: impl Into<PathBuf>, metadata_name: &str) -> Result<Self> {
        FileStore::validate_name(metadata_name)
            .map_err(|e| BookshelfError::Config(format!("metadata file name: {e}")))?;

        let files = FileStore::new(upload_dir)?;
        let metadata = MetadataStore::new(files.base_path().join(metadata_name));

        Ok(Self {
            files,
            metadata,
            lock: Mutex::new(()),
        })
    }

    /// Open the catalog described by the files configuration.
    pub fn open(config: &FilesConfig) -> Result<Self> {
        Self::new(&config.upload_dir, &config.metadata_name)
    }

    /// The file store.
    pub fn files(&self) -> &FileStore {
        &self.files
    }

    /// The metadata store.
    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    /// Store an uploaded file and record it.
    ///
    /// A duplicate name is not an error; it is reported as
    /// [`UploadOutcome::Duplicate`] and leaves the catalog unchanged.
    pub fn upload(&self, upload: NewUpload) -> Result<UploadOutcome> {
        if upload.content.is_empty() {
            tracing::warn!(name = %upload.name, "Rejected empty upload");
            return Err(BookshelfError::Validation(
                "Select a non-empty file to upload".to_string(),
            ));
        }

        FileStore::validate_name(&upload.name)?;
        if self.metadata.owns_file_name(&upload.name) {
            return Err(BookshelfError::InvalidName(format!(
                "{} is reserved",
                upload.name
            )));
        }

        let _guard = self.guard();

        let records = self.metadata.list()?;
        if let Some(duplicate) = find_duplicate(&records, &upload.name, upload.size()) {
            if duplicate.size_mismatch {
                tracing::warn!(
                    name = %upload.name,
                    existing_size = duplicate.existing.size,
                    upload_size = upload.size(),
                    "A file with the same name but a different size already exists"
                );
            } else {
                tracing::info!(name = %upload.name, "File already exists");
            }
            return Ok(UploadOutcome::Duplicate(duplicate));
        }

        self.files.write(&upload.name, &upload.content)?;
        tracing::info!(name = %upload.name, size = upload.size(), "Stored file");

        let record = Record {
            id: generate_id(),
            name: upload.name.clone(),
            content_type: upload.resolved_content_type(),
            size: upload.size(),
        };

        if let Err(e) = self.metadata.put(&record.id, record.to_entry()) {
            tracing::error!(name = %record.name, error = %e, "Failed to record metadata");
            // Try to clean up the stored file
            let _ = self.files.delete(&record.name);
            return Err(e);
        }
        tracing::info!(id = %record.id, name = %record.name, "Added metadata");

        Ok(UploadOutcome::Stored(record))
    }

    /// All records, oldest first.
    pub fn list(&self) -> Result<Vec<Record>> {
        self.metadata.list()
    }

    /// Look up a record.
    pub fn get(&self, id: &str) -> Result<Record> {
        self.metadata.get(id)
    }

    /// Load a record and its file content.
    pub fn download(&self, id: &str) -> Result<Download> {
        let record = self.metadata.get(id)?;
        let content = self.files.read(&record.name)?;

        tracing::info!(id, name = %record.name, "Serving download");
        Ok(Download { record, content })
    }

    /// Delete a record and its file.
    ///
    /// Returns whether a file was physically removed; a file that was already
    /// gone still lets the record be dropped. An unknown id is `NotFound`.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let _guard = self.guard();

        let record = self.metadata.get(id)?;
        let file_removed = match FileStore::validate_name(&record.name) {
            Ok(()) => self.files.delete(&record.name)?,
            Err(e) => {
                // No file can exist under an invalid name; drop the record.
                tracing::warn!(id, error = %e, "Record has an unusable file name");
                false
            }
        };
        if !file_removed {
            tracing::warn!(id, name = %record.name, "File was already missing");
        }

        self.metadata.remove(id)?;
        tracing::info!(id, name = %record.name, "Deleted file and metadata");

        Ok(file_removed)
    }

    /// The metadata file as stored on disk.
    pub fn metadata_json(&self) -> Result<String> {
        self.metadata.raw()
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|e| e.into_inner())
    }
}
