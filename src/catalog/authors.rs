//! Distinct author names in first-seen order

use indexmap::IndexSet;

use crate::models::Book;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorIndex {
    names: IndexSet<String>,
}

impl AuthorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the index from a scan of books, deduplicating authors.
    pub fn from_books<'a, I>(books: I) -> Self
    where
        I: IntoIterator<Item = &'a Book>,
    {
        let mut index = Self::new();
        for book in books {
            index.register(&book.author);
        }
        index
    }

    /// Returns `true` when the author was not known yet.
    pub fn register(&mut self, author: &str) -> bool {
        if self.names.contains(author) {
            return false;
        }
        self.names.insert(author.to_string())
    }

    pub fn unregister(&mut self, author: &str) -> bool {
        self.names.shift_remove(author)
    }

    pub fn contains(&self, author: &str) -> bool {
        self.names.contains(author)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }
}
