//! Checkout and return
//!
//! Each operation is two ordered steps, one against the store and one
//! against the mirror. They are not a transaction: when the second step
//! fails the two sides disagree and the caller gets
//! [`AppError::Inconsistent`]. Nothing is retried or compensated here.
//!
//! Checkout trusts the store, which remembers books lent before this
//! process started. Return trusts the mirror, which knows which user this
//! process lent a given copy to.

use std::sync::Arc;

use crate::{
    catalog::CatalogMirror,
    error::{AppError, AppResult},
    models::Book,
    repository::CatalogStore,
};

#[derive(Clone)]
pub struct LendingCoordinator {
    store: Arc<dyn CatalogStore>,
    mirror: Arc<CatalogMirror>,
}

impl LendingCoordinator {
    pub fn new(store: Arc<dyn CatalogStore>, mirror: Arc<CatalogMirror>) -> Self {
        Self { store, mirror }
    }

    /// Lend book `index` to `username`.
    ///
    /// Without `author` the index must name a single book.
    pub async fn checkout(
        &self,
        index: i32,
        author: Option<&str>,
        username: &str,
    ) -> AppResult<Book> {
        require_username(username)?;

        let row = match author {
            Some(author) => self.store.mark_taken(author, index).await?,
            None => self.store.mark_taken_by_index(index).await?,
        };
        let taken = match row {
            Some(taken) => taken,
            None => return Err(self.not_taken(index, author).await),
        };

        match self.mirror.checkout(&taken, username).await {
            Ok(book) => {
                tracing::info!(
                    index,
                    author = %book.author,
                    username,
                    take_count = book.take_count,
                    "Book taken"
                );
                Ok(book)
            }
            Err(AppError::NotFound(_)) => {
                tracing::error!(
                    index,
                    author = %taken.author,
                    username,
                    "Store blocked a book the mirror does not have available"
                );
                Err(AppError::Inconsistent(format!(
                    "Book {} by {} is blocked in the store but not available in the catalog",
                    index, taken.author
                )))
            }
            Err(e) => Err(e),
        }
    }

    /// Take book `index` back from `username`.
    ///
    /// Without `author` the user must hold a single book with `index`.
    pub async fn return_book(
        &self,
        index: i32,
        author: Option<&str>,
        username: &str,
    ) -> AppResult<Book> {
        require_username(username)?;

        let book = self.mirror.return_book(username, index, author).await?;

        let rows = match self.store.mark_returned(&book.author, index).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(
                    index,
                    author = %book.author,
                    username,
                    error = %e,
                    "Book returned to the catalog but the store was not updated"
                );
                return Err(AppError::Inconsistent(format!(
                    "Book {} by {} is available in the catalog but still blocked in the store: {}",
                    index, book.author, e
                )));
            }
        };

        if rows == 0 {
            return Err(AppError::Conflict(format!(
                "Book {} by {} not found or already returned",
                index, book.author
            )));
        }

        tracing::info!(index, author = %book.author, username, "Book returned");
        Ok(book)
    }

    /// Error for a checkout the store refused.
    async fn not_taken(&self, index: i32, author: Option<&str>) -> AppError {
        if let Some(author) = author {
            return AppError::Conflict(format!(
                "Book {} by {} not found or already taken",
                index, author
            ));
        }
        if self.mirror.authors_with_index(index).await.len() > 1 {
            return AppError::BadRequest(format!(
                "Several authors have a book with index {}; specify the author",
                index
            ));
        }
        AppError::Conflict(format!("Book {} not found or already taken", index))
    }
}

fn require_username(username: &str) -> AppResult<()> {
    if username.trim().is_empty() {
        return Err(AppError::Validation("Username is required".to_string()));
    }
    Ok(())
}
