//! Bookshelf - a small self-hosted file upload and catalog service.
//!
//! Uploaded files are kept in one directory next to a JSON metadata file
//! that maps generated ids to the file name, content type and size.

pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod web;

pub use catalog::{Catalog, FileStore, MetadataStore, NewUpload, Record, UploadOutcome};
pub use config::Config;
pub use error::{BookshelfError, Result};
