//! Data models for the book catalog

pub mod book;
pub mod query;
pub mod related;

// Re-export commonly used types
pub use book::{Book, BookListResponse, BookRecord, FormatRecord};
pub use query::{BookFilter, BookListParams, Page};
pub use related::{Author, Bookshelf, Format, Language, Subject};
