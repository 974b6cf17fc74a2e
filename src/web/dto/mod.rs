//! Data Transfer Objects for the Bookshelf web service.

pub mod response;

pub use response::*;
