//! Repository layer for database operations

pub mod books;
pub mod plan;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{Book, Page},
};

pub use plan::BookQueryPlan;

/// Read access to the book catalog.
///
/// Implementations must count and fetch distinct books: a book reached
/// through several matching related rows is counted and returned once.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Number of distinct books matching the plan
    async fn count_books(&self, plan: &BookQueryPlan) -> AppResult<i64>;

    /// Matching books ordered by `download_count` (descending, missing last)
    /// then id, windowed by `page`, with every related collection loaded
    async fn fetch_books(&self, plan: &BookQueryPlan, page: Page) -> AppResult<Vec<Book>>;
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round trip to the database, used by the readiness probe
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
