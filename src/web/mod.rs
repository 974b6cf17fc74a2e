//! Web module for Bookshelf.
//!
//! Serves the upload page, the book list, downloads and the JSON API.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
