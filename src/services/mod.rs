//! Business logic services

pub mod catalog;

use std::sync::Arc;

use crate::{config::PaginationConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    /// Kept for the readiness probe
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, pagination: PaginationConfig) -> Self {
        Self {
            catalog: catalog::CatalogService::new(Arc::new(repository.books.clone()), pagination),
            repository,
        }
    }
}
