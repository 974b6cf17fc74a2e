//! Response DTOs for the Bookshelf web service.

use serde::Serialize;

use crate::catalog::Record;

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// A catalog record as returned by the API.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct BookResponse {
    /// Record id.
    pub id: String,
    /// Original filename.
    pub name: String,
    /// Content type.
    pub content_type: String,
    /// Size in bytes.
    pub size: u64,
    /// Where to download the file.
    pub download_url: String,
}

impl From<Record> for BookResponse {
    fn from(record: Record) -> Self {
        let download_url = format!("/download/{}", urlencoding::encode(&record.id));
        Self {
            id: record.id,
            name: record.name,
            content_type: record.content_type,
            size: record.size,
            download_url,
        }
    }
}
