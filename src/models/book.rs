//! Book model and the flattened records returned by `GET /books`.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::related::{Author, Bookshelf, Format, Language, Subject};

/// Root entity of every catalog query.
///
/// Scalar columns come from `books_book`; the five collections are resolved
/// in a second round trip for the whole page at once.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i32,
    pub title: Option<String>,
    pub download_count: Option<i32>,
    // Relations (loaded separately)
    #[sqlx(skip)]
    #[serde(default)]
    pub authors: Vec<Author>,
    #[sqlx(skip)]
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[sqlx(skip)]
    #[serde(default)]
    pub bookshelves: Vec<Bookshelf>,
    #[sqlx(skip)]
    #[serde(default)]
    pub languages: Vec<Language>,
    #[sqlx(skip)]
    #[serde(default)]
    pub formats: Vec<Format>,
}

/// Format as exposed to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FormatRecord {
    pub mime_type: String,
    pub url: String,
}

/// One book in a catalog response. No internal identifiers are exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BookRecord {
    /// Title, `null` when unknown
    pub title: Option<String>,
    /// Popularity metric used for ordering, `null` when unknown
    pub download_count: Option<i32>,
    pub authors: Vec<String>,
    pub languages: Vec<String>,
    pub subjects: Vec<String>,
    pub bookshelves: Vec<String>,
    pub formats: Vec<FormatRecord>,
}

/// Paginated catalog response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BookListResponse {
    /// Number of distinct matching books, ignoring offset and limit
    pub total: i64,
    /// The requested page, in ranking order
    pub books: Vec<BookRecord>,
}

impl From<Book> for BookRecord {
    fn from(book: Book) -> Self {
        Self {
            title: book.title,
            download_count: book.download_count,
            authors: book.authors.into_iter().filter_map(|a| a.name).collect(),
            languages: book.languages.into_iter().filter_map(|l| l.code).collect(),
            subjects: book.subjects.into_iter().filter_map(|s| s.name).collect(),
            bookshelves: book.bookshelves.into_iter().filter_map(|b| b.name).collect(),
            formats: book
                .formats
                .into_iter()
                .filter_map(|f| match (f.mime_type, f.url) {
                    (Some(mime_type), Some(url)) => Some(FormatRecord { mime_type, url }),
                    _ => None,
                })
                .collect(),
        }
    }
}

impl BookListResponse {
    /// Pair an already ordered page with the independently counted total
    pub fn assemble(total: i64, page: Vec<Book>) -> Self {
        Self {
            total,
            books: page.into_iter().map(BookRecord::from).collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            total: 0,
            books: Vec::new(),
        }
    }
}
