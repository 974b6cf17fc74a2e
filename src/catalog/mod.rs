//! Book catalog for Bookshelf.
//!
//! This module provides the upload directory and everything kept in it:
//! - Raw uploaded files, stored under their original names
//! - A JSON metadata file mapping generated ids to file records
//! - The catalog service tying both together (upload, list, download, delete)

mod metadata;
mod record;
mod service;
mod storage;

pub use metadata::{Metadata, MetadataStore};
pub use record::{generate_id, Record, StoredEntry};
pub use service::{find_duplicate, Catalog, Download, Duplicate, NewUpload, UploadOutcome};
pub use storage::FileStore;

/// Maximum length for a stored filename (in bytes).
pub const MAX_NAME_LENGTH: usize = 255;

/// Content type used when neither the client nor the extension tells us one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
