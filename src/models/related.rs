//! Entities related to a book.
//!
//! Authors, subjects, bookshelves and languages reach a book through a link
//! table (`books_book_<entity>`); formats carry their owning `book_id`.
//! All of them are owned by the upstream dataset and only ever read here.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Author {
    pub id: i32,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Subject {
    pub id: i32,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Bookshelf {
    pub id: i32,
    pub name: Option<String>,
}

/// Language, identified by its code (`en`, `fr`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Language {
    pub id: i32,
    pub code: Option<String>,
}

/// A downloadable rendition of a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Format {
    pub id: i32,
    pub mime_type: Option<String>,
    pub url: Option<String>,
    pub book_id: i32,
}
