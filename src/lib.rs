//! Book catalog server
//!
//! A read-only REST JSON API over a relational book dataset: filter books by
//! identity, title, author, topic, language and format, with a distinct total
//! and a page ranked by download count.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<services::Services>,
}
