//! In-memory catalog mirror
//!
//! Holds the books that can be lent and the books each user currently
//! holds. All state sits behind one `RwLock`: mutations take the write
//! guard, snapshots the read guard. Methods never call one another while
//! holding the guard, and no guard is held across a store call.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::{allocate_index, AuthorIndex};
use crate::{
    error::{AppError, AppResult},
    models::Book,
};

#[derive(Debug, Default)]
struct MirrorState {
    available: Vec<Book>,
    loans: HashMap<String, Vec<Book>>,
    /// Blocked in the store before this process started; holder unknown.
    unattributed: Vec<Book>,
    authors: AuthorIndex,
}

impl MirrorState {
    fn all_books(&self) -> impl Iterator<Item = &Book> {
        self.available
            .iter()
            .chain(self.loans.values().flatten())
            .chain(self.unattributed.iter())
    }

    fn find_mut(&mut self, author: &str, index: i32) -> Option<&mut Book> {
        self.available
            .iter_mut()
            .chain(self.loans.values_mut().flatten())
            .chain(self.unattributed.iter_mut())
            .find(|b| b.is(author, index))
    }
}

/// Shared in-memory view of the catalog
#[derive(Debug, Default)]
pub struct CatalogMirror {
    state: RwLock<MirrorState>,
}

impl CatalogMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the mirror from store rows.
    ///
    /// Unblocked rows become available; blocked rows are kept aside as
    /// unattributed since no user of this process holds them.
    pub fn from_books(books: Vec<Book>) -> Self {
        let mut state = MirrorState::default();
        for book in books {
            state.authors.register(&book.author);
            if book.blocked {
                state.unattributed.push(book);
            } else {
                state.available.push(book);
            }
        }
        if !state.unattributed.is_empty() {
            tracing::warn!(
                count = state.unattributed.len(),
                "Books already lent at startup; their holders are unknown"
            );
        }
        Self {
            state: RwLock::new(state),
        }
    }

    /// Move an available book into `username`'s loans.
    ///
    /// `row` is the store row that was just blocked; its take count is
    /// carried into the mirror copy.
    pub async fn checkout(&self, row: &Book, username: &str) -> AppResult<Book> {
        if username.is_empty() {
            return Err(AppError::Validation("Username is required".to_string()));
        }

        let mut state = self.state.write().await;
        let pos = state
            .available
            .iter()
            .position(|b| b.is(&row.author, row.index))
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Book {} by {} is not available",
                    row.index, row.author
                ))
            })?;

        let mut book = state.available.remove(pos);
        book.blocked = true;
        book.take_count = row.take_count;
        state
            .loans
            .entry(username.to_string())
            .or_default()
            .push(book.clone());
        Ok(book)
    }

    /// Move a book held by `username` back to the available shelf.
    ///
    /// Without `author` the user must hold exactly one book with `index`.
    pub async fn return_book(
        &self,
        username: &str,
        index: i32,
        author: Option<&str>,
    ) -> AppResult<Book> {
        let mut state = self.state.write().await;
        let held = state
            .loans
            .get_mut(username)
            .ok_or_else(|| AppError::NotFound(format!("User {} has no books", username)))?;

        let matching: Vec<usize> = held
            .iter()
            .enumerate()
            .filter(|(_, b)| b.index == index && author.map_or(true, |a| b.author == a))
            .map(|(pos, _)| pos)
            .collect();

        let pos = match matching.as_slice() {
            [pos] => *pos,
            [] => {
                return Err(AppError::NotFound(format!(
                    "Book {} not found for user {}",
                    index, username
                )))
            }
            _ => {
                return Err(AppError::BadRequest(format!(
                    "User {} holds several books with index {}; specify the author",
                    username, index
                )))
            }
        };

        let mut book = held.remove(pos);
        if held.is_empty() {
            state.loans.remove(username);
        }
        book.blocked = false;
        state.available.push(book.clone());
        Ok(book)
    }

    /// Authors owning a book with `index`, wherever it is.
    pub async fn authors_with_index(&self, index: i32) -> Vec<String> {
        let state = self.state.read().await;
        let mut authors: Vec<String> = state
            .all_books()
            .filter(|b| b.index == index)
            .map(|b| b.author.clone())
            .collect();
        authors.sort();
        authors.dedup();
        authors
    }

    /// Add a new book, assigning the smallest free index for its author.
    pub async fn add_book(&self, title: &str, author: &str) -> Book {
        let mut state = self.state.write().await;
        let index = allocate_index(
            state
                .all_books()
                .filter(|b| b.author == author)
                .map(|b| b.index),
        );

        let book = Book::new(index, title, author);
        state.available.push(book.clone());
        if state.authors.register(author) {
            tracing::debug!(author, "New author registered");
        }
        book
    }

    /// Undo an `add_book` whose store insert failed.
    pub async fn withdraw(&self, author: &str, index: i32) -> AppResult<Book> {
        let mut state = self.state.write().await;
        let pos = state
            .available
            .iter()
            .position(|b| b.is(author, index))
            .ok_or_else(|| {
                AppError::NotFound(format!("Book {} by {} is not available", index, author))
            })?;

        let book = state.available.remove(pos);
        if !state.all_books().any(|b| b.author == author) {
            state.authors.unregister(author);
        }
        Ok(book)
    }

    /// Change the title of a book wherever it currently is.
    pub async fn rename(&self, author: &str, index: i32, title: &str) -> AppResult<Book> {
        let mut state = self.state.write().await;
        let book = state
            .find_mut(author, index)
            .ok_or_else(|| AppError::NotFound(format!("Book {} by {} not found", index, author)))?;
        book.title = title.to_string();
        Ok(book.clone())
    }

    /// Authors in the order they were first seen.
    pub async fn list_authors(&self) -> Vec<String> {
        self.state.read().await.authors.to_vec()
    }

    /// Authors recomputed from every book in the mirror.
    pub async fn scan_authors(&self) -> AuthorIndex {
        let state = self.state.read().await;
        AuthorIndex::from_books(state.all_books())
    }

    pub async fn available(&self) -> Vec<Book> {
        self.state.read().await.available.clone()
    }

    pub async fn loans_of(&self, username: &str) -> Vec<Book> {
        self.state
            .read()
            .await
            .loans
            .get(username)
            .cloned()
            .unwrap_or_default()
    }

    /// Consistent view of the mirror taken under one read guard.
    pub async fn snapshot(&self) -> MirrorSnapshot {
        let state = self.state.read().await;
        MirrorSnapshot {
            available: state.available.clone(),
            loans: state.loans.clone(),
            unattributed: state.unattributed.clone(),
            authors: state.authors.clone(),
        }
    }
}

/// Point-in-time copy of the mirror
#[derive(Debug, Clone)]
pub struct MirrorSnapshot {
    pub available: Vec<Book>,
    pub loans: HashMap<String, Vec<Book>>,
    pub unattributed: Vec<Book>,
    pub authors: AuthorIndex,
}

impl MirrorSnapshot {
    /// Where a book currently sits, `None` if unknown.
    pub fn holder_of(&self, author: &str, index: i32) -> Option<Placement<'_>> {
        if self.available.iter().any(|b| b.is(author, index)) {
            return Some(Placement::Available);
        }
        if let Some((user, _)) = self
            .loans
            .iter()
            .find(|(_, books)| books.iter().any(|b| b.is(author, index)))
        {
            return Some(Placement::Lent(user));
        }
        if self.unattributed.iter().any(|b| b.is(author, index)) {
            return Some(Placement::Unattributed);
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement<'a> {
    Available,
    Lent(&'a str),
    Unattributed,
}
