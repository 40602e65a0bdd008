//! Shared test fixtures

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use lending_server::{
    catalog::CatalogMirror,
    config::{AppConfig, AuthConfig, DatabaseConfig, LoggingConfig, SeedConfig, ServerConfig},
    error::{AppError, AppResult},
    models::Book,
    repository::{CatalogStore, Repository},
    services::Services,
    AppState,
};

/// `books` table kept in memory, with the same conditional updates.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Book>>,
}

impl MemoryStore {
    pub fn with_books(books: Vec<Book>) -> Self {
        Self {
            rows: Mutex::new(books),
        }
    }

    pub async fn row(&self, author: &str, index: i32) -> Option<Book> {
        self.rows
            .lock()
            .await
            .iter()
            .find(|b| b.is(author, index))
            .cloned()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_books(&self) -> AppResult<Vec<Book>> {
        Ok(self.rows.lock().await.clone())
    }

    async fn book_exists(&self, title: &str, author: &str) -> AppResult<bool> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .any(|b| b.title == title && b.author == author))
    }

    async fn insert_book(&self, book: &Book) -> AppResult<()> {
        let mut rows = self.rows.lock().await;
        if rows
            .iter()
            .any(|b| b.is(&book.author, book.index) || (b.title == book.title && b.author == book.author))
        {
            return Err(AppError::AlreadyExists(format!("{} by {}", book.title, book.author)));
        }
        rows.push(book.clone());
        Ok(())
    }

    async fn mark_taken(&self, author: &str, index: i32) -> AppResult<Option<Book>> {
        let mut rows = self.rows.lock().await;
        Ok(rows
            .iter_mut()
            .find(|b| b.is(author, index) && !b.blocked)
            .map(take))
    }

    async fn mark_taken_by_index(&self, index: i32) -> AppResult<Option<Book>> {
        let mut rows = self.rows.lock().await;
        if rows.iter().filter(|b| b.index == index).count() != 1 {
            return Ok(None);
        }
        Ok(rows
            .iter_mut()
            .find(|b| b.index == index && !b.blocked)
            .map(take))
    }

    async fn mark_returned(&self, author: &str, index: i32) -> AppResult<u64> {
        let mut rows = self.rows.lock().await;
        match rows.iter_mut().find(|b| b.is(author, index) && b.blocked) {
            Some(b) => {
                b.blocked = false;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn rename_book(&self, author: &str, index: i32, title: &str) -> AppResult<u64> {
        let mut rows = self.rows.lock().await;
        if rows.iter().any(|b| b.author == author && b.title == title && b.index != index) {
            return Err(AppError::AlreadyExists(format!("{} by {}", title, author)));
        }
        match rows.iter_mut().find(|b| b.is(author, index)) {
            Some(b) => {
                b.title = title.to_string();
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

fn take(book: &mut Book) -> Book {
    book.blocked = true;
    book.take_count += 1;
    book.clone()
}

pub const JWT_SECRET: &str = "integration-secret";

pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig::default(),
        database: DatabaseConfig::default(),
        auth: AuthConfig {
            jwt_secret: JWT_SECRET.to_string(),
            jwt_expiration_hours: 1,
        },
        logging: LoggingConfig::default(),
        seed: SeedConfig {
            books: 0,
            authors: 0,
            accounts: 0,
        },
    }
}

/// Services over an in-memory store. The pool is lazy and never used by
/// the catalog paths.
pub fn services_with(store: Arc<MemoryStore>, mirror: Arc<CatalogMirror>) -> Services {
    let pool = sqlx::PgPool::connect_lazy("postgres://test@localhost/test").expect("Test pool");
    Services::new(Repository::new(pool), store, mirror, test_config().auth)
}

pub async fn app_state(books: Vec<Book>) -> (AppState, Arc<MemoryStore>, Arc<CatalogMirror>) {
    let store = Arc::new(MemoryStore::with_books(books.clone()));
    let mirror = Arc::new(CatalogMirror::from_books(books));
    let services = services_with(store.clone(), mirror.clone());
    let state = AppState {
        config: Arc::new(test_config()),
        services: Arc::new(services),
    };
    (state, store, mirror)
}
