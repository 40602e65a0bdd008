//! Catalog management service

use std::sync::Arc;

use crate::{
    catalog::CatalogMirror,
    error::{AppError, AppResult},
    models::Book,
    repository::CatalogStore,
};

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    mirror: Arc<CatalogMirror>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>, mirror: Arc<CatalogMirror>) -> Self {
        Self { store, mirror }
    }

    /// Add a book; its index is the smallest one free for the author.
    ///
    /// The mirror allocates the index, then the row is inserted. If the
    /// insert fails the book is withdrawn from the mirror again.
    pub async fn add_book(&self, title: &str, author: &str) -> AppResult<Book> {
        let title = title.trim();
        let author = author.trim();
        if title.is_empty() || author.is_empty() {
            return Err(AppError::Validation("Title and author are required".to_string()));
        }

        if self.store.book_exists(title, author).await? {
            return Err(AppError::AlreadyExists(format!(
                "Book '{}' by {} already exists",
                title, author
            )));
        }

        let book = self.mirror.add_book(title, author).await;

        if let Err(e) = self.store.insert_book(&book).await {
            tracing::warn!(index = book.index, author, error = %e, "Insert failed, withdrawing book");
            if let Err(withdraw_err) = self.mirror.withdraw(author, book.index).await {
                return Err(AppError::Inconsistent(format!(
                    "Book {} by {} could not be stored ({}) nor withdrawn ({})",
                    book.index, author, e, withdraw_err
                )));
            }
            return Err(e);
        }

        tracing::info!(index = book.index, author, "Book added");
        Ok(book)
    }

    /// Distinct authors, first-seen order
    pub async fn list_authors(&self) -> Vec<String> {
        self.mirror.list_authors().await
    }

    /// Every row of the store, lent or not
    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.store.list_books().await
    }

    pub async fn available_books(&self) -> Vec<Book> {
        self.mirror.available().await
    }

    pub async fn loans_of(&self, username: &str) -> Vec<Book> {
        self.mirror.loans_of(username).await
    }

    /// Retitle a book in the store, then in the mirror.
    pub async fn rename_book(&self, author: &str, index: i32, title: &str) -> AppResult<Book> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }

        let rows = self.store.rename_book(author, index, title).await?;
        if rows == 0 {
            return Err(AppError::NotFound(format!("Book {} by {} not found", index, author)));
        }

        match self.mirror.rename(author, index, title).await {
            Err(AppError::NotFound(_)) => Err(AppError::Inconsistent(format!(
                "Book {} by {} renamed in the store but missing from the catalog",
                index, author
            ))),
            other => other,
        }
    }
}
