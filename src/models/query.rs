//! Catalog query parameters and the validated filter specification built from them.

use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::{
    config::PaginationConfig,
    error::{AppError, AppResult},
};

/// Raw query string of `GET /books`.
///
/// Multi-valued parameters may be repeated (`?languages=en&languages=fr`).
/// `ids`, `languages` and `mime_types` also accept comma separated values
/// (`?languages=en,fr`). Topics do not, since subject names such as
/// "Shakespeare, William" contain commas. A parameter given with an empty
/// value (`?ids=`) is an explicit empty set, which matches nothing.
///
/// The singular names `book_id`, `language`, `mime_type` and the plural
/// `topics` are accepted too, and may be mixed with the canonical names.
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookListParams {
    /// Book identities
    #[serde(default)]
    pub ids: Vec<String>,
    /// Same as `ids`
    #[serde(default)]
    pub book_id: Vec<String>,
    /// Case-insensitive substring of the title
    pub title: Option<String>,
    /// Case-insensitive substring of any author name
    pub author: Option<String>,
    /// Case-insensitive substring of any subject or bookshelf name, one per value
    #[serde(default)]
    pub topic: Vec<String>,
    /// Same as `topic`
    #[serde(default)]
    pub topics: Vec<String>,
    /// Language codes (exact match)
    #[serde(default)]
    pub languages: Vec<String>,
    /// Same as `languages`
    #[serde(default)]
    pub language: Vec<String>,
    /// MIME types of available formats (exact match)
    #[serde(default)]
    pub mime_types: Vec<String>,
    /// Same as `mime_types`
    #[serde(default)]
    pub mime_type: Vec<String>,
    /// Number of books to skip (default: 0)
    #[validate(range(min = 0, message = "offset must not be negative"))]
    pub offset: Option<i64>,
    /// Maximum number of books to return (default: 25)
    #[validate(range(min = 0, message = "limit must not be negative"))]
    pub limit: Option<i64>,
}

/// Declarative filter specification.
///
/// `None` leaves a category unconstrained. `Some` of an empty collection is a
/// membership test against the empty set and never matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub ids: Option<Vec<i32>>,
    pub title_contains: Option<String>,
    pub author_contains: Option<String>,
    pub topics: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    pub mime_types: Option<Vec<String>>,
}

/// Window applied after sorting and deduplication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self { offset, limit }
    }
}

impl BookFilter {
    /// True when some supplied category is an empty set
    pub fn matches_nothing(&self) -> bool {
        fn empty<T>(set: &Option<Vec<T>>) -> bool {
            set.as_ref().is_some_and(|v| v.is_empty())
        }

        empty(&self.ids) || empty(&self.topics) || empty(&self.languages) || empty(&self.mime_types)
    }
}

impl BookListParams {
    /// Validate the raw parameters and split them into filter and page.
    pub fn into_request(self, pagination: &PaginationConfig) -> AppResult<(BookFilter, Page)> {
        self.validate()?;

        let limit = self.limit.unwrap_or(pagination.default_limit);
        if limit > pagination.max_limit {
            return Err(AppError::Validation(format!(
                "limit must not exceed {}",
                pagination.max_limit
            )));
        }
        let page = Page::new(self.offset.unwrap_or(0), limit);

        let ids = list_param(merged(self.ids, self.book_id))
            .map(|values| {
                values
                    .iter()
                    .map(|v| {
                        v.parse::<i32>()
                            .map_err(|_| AppError::BadRequest(format!("Invalid book id '{}'", v)))
                    })
                    .collect::<AppResult<Vec<_>>>()
            })
            .transpose()?;

        let filter = BookFilter {
            ids,
            title_contains: text_param(self.title),
            author_contains: text_param(self.author),
            topics: term_param(merged(self.topic, self.topics)),
            languages: list_param(merged(self.languages, self.language)),
            mime_types: list_param(merged(self.mime_types, self.mime_type)),
        };

        Ok((filter, page))
    }
}

/// Absent parameter -> `None`, otherwise every non-blank comma separated value.
fn list_param(raw: Vec<String>) -> Option<Vec<String>> {
    if raw.is_empty() {
        return None;
    }

    Some(
        raw.iter()
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect(),
    )
}

/// Absent parameter -> `None`, otherwise every non-empty value kept whole.
fn term_param(raw: Vec<String>) -> Option<Vec<String>> {
    if raw.is_empty() {
        return None;
    }

    Some(raw.into_iter().filter(|v| !v.is_empty()).collect())
}

fn merged(mut canonical: Vec<String>, alias: Vec<String>) -> Vec<String> {
    canonical.extend(alias);
    canonical
}

fn text_param(raw: Option<String>) -> Option<String> {
    raw.filter(|v| !v.is_empty())
}
