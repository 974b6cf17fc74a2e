//! HTTP handlers for the Bookshelf web service.

pub mod books;
pub mod pages;

pub use books::*;
pub use pages::*;

use crate::catalog::Catalog;

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    /// Catalog of the upload directory.
    pub catalog: Catalog,
    /// Maximum upload size in bytes.
    pub max_upload_size: u64,
}

impl AppState {
    /// Create a new application state.
    pub fn new(catalog: Catalog, max_upload_size: u64) -> Self {
        Self {
            catalog,
            max_upload_size,
        }
    }
}
