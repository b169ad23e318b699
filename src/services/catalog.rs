//! Catalog query service

use std::sync::Arc;

use crate::{
    config::PaginationConfig,
    error::AppResult,
    models::{BookFilter, BookListParams, BookListResponse, Page},
    repository::{BookQueryPlan, BookStore},
};

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn BookStore>,
    pagination: PaginationConfig,
}

impl CatalogService {
    pub fn new(store: Arc<dyn BookStore>, pagination: PaginationConfig) -> Self {
        Self { store, pagination }
    }

    /// Validate raw query parameters, then search.
    ///
    /// Invalid parameters are rejected before the store is touched.
    pub async fn list_books(&self, params: BookListParams) -> AppResult<BookListResponse> {
        let (filter, page) = params.into_request(&self.pagination)?;
        self.search(&filter, page).await
    }

    /// Count and fetch the books matching `filter`.
    ///
    /// The total ignores `page`. Either both queries succeed or the search
    /// fails as a whole.
    pub async fn search(&self, filter: &BookFilter, page: Page) -> AppResult<BookListResponse> {
        tracing::debug!(?filter, offset = page.offset, limit = page.limit, "Catalog search");

        if filter.matches_nothing() {
            tracing::debug!("Filter contains an empty set, skipping store access");
            return Ok(BookListResponse::empty());
        }

        let plan = BookQueryPlan::from_filter(filter);

        // No snapshot is shared between the two reads; a concurrent write may
        // make the total disagree with the page by a few rows.
        let (total, books) = tokio::try_join!(
            self.store.count_books(&plan),
            self.store.fetch_books(&plan, page),
        )?;

        tracing::info!(
            "Catalog search matched {} books, returning {}",
            total,
            books.len()
        );

        Ok(BookListResponse::assemble(total, books))
    }
}
