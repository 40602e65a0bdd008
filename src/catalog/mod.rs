//! In-process catalog state
//!
//! The mirror keeps available books and per-user loans in memory, allocates
//! per-author indices and tracks the set of known authors.

pub mod allocator;
pub mod authors;
pub mod mirror;

pub use allocator::allocate_index;
pub use authors::AuthorIndex;
pub use mirror::CatalogMirror;
