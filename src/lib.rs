//! Library lending server
//!
//! REST JSON API over a book catalog. Lending state is kept in an
//! in-process mirror and in PostgreSQL, updated in two ordered steps per
//! checkout or return.

use std::sync::Arc;

pub mod api;
pub mod catalog;
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
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
