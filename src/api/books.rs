//! Book catalog endpoints

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::{BookListParams, BookListResponse},
    AppState,
};

use super::ListQuery;

/// Search the catalog
///
/// Every supplied filter must hold; topic terms match either a subject or a
/// bookshelf. Results are ordered by download count, most popular first.
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookListParams),
    responses(
        (status = 200, description = "Matching books", body = BookListResponse),
        (status = 400, description = "Invalid parameters", body = crate::error::ErrorResponse),
        (status = 500, description = "Catalog database failure", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    ListQuery(params): ListQuery<BookListParams>,
) -> AppResult<Json<BookListResponse>> {
    let response = state.services.catalog.list_books(params).await?;
    Ok(Json(response))
}
