//! Catalog persistence port.

use async_trait::async_trait;

use crate::domain::{Book, BookId, BookStatus, CatalogEntry, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by catalog repository adapters.
    pub enum BookRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "book repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "book repository query failed: {message}",
        /// A pending exchange still references the book.
        Referenced { book_id: String } => "book {book_id} is referenced by a pending exchange",
        /// The book left the `available` status before it could be removed.
        NotAvailable { book_id: String } => "book {book_id} is not available",
    }
}

/// Storage of book records and their availability.
///
/// Listings are ordered newest first.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Insert a freshly listed book and return it with its owner's username.
    async fn insert(&self, book: &Book) -> Result<CatalogEntry, BookRepositoryError>;

    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, BookRepositoryError>;

    /// Available books, omitting those owned by `excluding_owner`.
    async fn list_available(
        &self,
        excluding_owner: Option<UserId>,
    ) -> Result<Vec<CatalogEntry>, BookRepositoryError>;

    /// Books owned by `owner`, optionally restricted to one status.
    async fn list_owned(
        &self,
        owner: &UserId,
        status: Option<BookStatus>,
    ) -> Result<Vec<CatalogEntry>, BookRepositoryError>;

    /// Assign a status without legality checks. Returns `false` when the book
    /// does not exist.
    async fn set_status(&self, id: BookId, status: BookStatus) -> Result<bool, BookRepositoryError>;

    /// Atomically delete an `available` book that no pending exchange
    /// references. Returns the removed book, or `None` if it was already gone.
    async fn delete_available(&self, id: BookId) -> Result<Option<Book>, BookRepositoryError>;
}
