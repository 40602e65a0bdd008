//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A lendable book.
///
/// `index` is unique among the books of one `author`; the pair
/// `(author, index)` identifies a physical copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    #[sqlx(rename = "book_index")]
    pub index: i32,
    pub title: String,
    pub author: String,
    pub blocked: bool,
    pub take_count: i32,
}

impl Book {
    /// A fresh, never-lent book
    pub fn new(index: i32, title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            index,
            title: title.into(),
            author: author.into(),
            blocked: false,
            take_count: 0,
        }
    }

    pub fn is(&self, author: &str, index: i32) -> bool {
        self.index == index && self.author == author
    }
}

/// Add book request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBook {
    pub title: String,
    pub author: String,
}

/// Rename book request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBook {
    /// Author owning the index
    pub author: String,
    /// New title
    pub title: String,
}
