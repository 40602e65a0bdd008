//! Books table access
//!
//! The `books` table is the source of truth for lending history: the
//! `blocked` flag and `take_count` are only ever changed through the
//! conditional updates below.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::Book,
};

/// Persistent catalog collaborator used by the lending core.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Every book row
    async fn list_books(&self) -> AppResult<Vec<Book>>;

    async fn book_exists(&self, title: &str, author: &str) -> AppResult<bool>;

    /// Insert a new row; a duplicate `(title, author)` or `(author, index)`
    /// yields `AlreadyExists`.
    async fn insert_book(&self, book: &Book) -> AppResult<()>;

    /// Block the row `(author, index)` and bump its take count.
    /// `None` when no such row exists or it is already taken.
    async fn mark_taken(&self, author: &str, index: i32) -> AppResult<Option<Book>>;

    /// Same as [`CatalogStore::mark_taken`] for a bare index, which must
    /// belong to exactly one row. `None` when it is shared, absent or taken.
    async fn mark_taken_by_index(&self, index: i32) -> AppResult<Option<Book>>;

    /// Unblock the row if it is blocked; returns rows affected.
    async fn mark_returned(&self, author: &str, index: i32) -> AppResult<u64>;

    /// Returns rows affected.
    async fn rename_book(&self, author: &str, index: i32, title: &str) -> AppResult<u64>;
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_duplicate(e: sqlx::Error, what: String) -> AppError {
    match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::AlreadyExists(what),
        other => AppError::Unavailable(other),
    }
}

#[async_trait]
impl CatalogStore for BooksRepository {
    async fn list_books(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT book_index, title, author, blocked, take_count FROM books ORDER BY book_index, author",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    async fn book_exists(&self, title: &str, author: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM books WHERE title = $1 AND author = $2)",
        )
        .bind(title)
        .bind(author)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert_book(&self, book: &Book) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO books (book_index, title, author, blocked, take_count)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(book.index)
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.blocked)
        .bind(book.take_count)
        .execute(&self.pool)
        .await
        .map_err(|e| map_duplicate(e, format!("Book '{}' by {} already exists", book.title, book.author)))?;
        Ok(())
    }

    async fn mark_taken(&self, author: &str, index: i32) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET blocked = TRUE, take_count = take_count + 1
            WHERE author = $1 AND book_index = $2 AND blocked = FALSE
            RETURNING book_index, title, author, blocked, take_count
            "#,
        )
        .bind(author)
        .bind(index)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    async fn mark_taken_by_index(&self, index: i32) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET blocked = TRUE, take_count = take_count + 1
            WHERE book_index = $1 AND blocked = FALSE
            AND (SELECT COUNT(*) FROM books WHERE book_index = $1) = 1
            RETURNING book_index, title, author, blocked, take_count
            "#,
        )
        .bind(index)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    async fn mark_returned(&self, author: &str, index: i32) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE books SET blocked = FALSE WHERE author = $1 AND book_index = $2 AND blocked = TRUE",
        )
        .bind(author)
        .bind(index)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn rename_book(&self, author: &str, index: i32, title: &str) -> AppResult<u64> {
        let result = sqlx::query("UPDATE books SET title = $1 WHERE author = $2 AND book_index = $3")
            .bind(title)
            .bind(author)
            .bind(index)
            .execute(&self.pool)
            .await
            .map_err(|e| map_duplicate(e, format!("Book '{}' by {} already exists", title, author)))?;
        Ok(result.rows_affected())
    }
}
