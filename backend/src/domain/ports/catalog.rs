//! Driving port for listing, browsing and removing books.

use async_trait::async_trait;

use crate::domain::{BookDetails, BookId, BookStatus, CatalogEntry, Error, UserId};

use super::CoverUpload;

/// A book a member wants to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewListing {
    pub details: BookDetails,
    pub cover: Option<CoverUpload>,
}

/// Catalog use-cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Catalog: Send + Sync {
    /// List a book owned by `owner` with status `available`.
    async fn list_book(&self, owner: &UserId, listing: NewListing) -> Result<CatalogEntry, Error>;

    /// Available books, newest first, hiding the viewer's own.
    async fn browse(&self, viewer: Option<UserId>) -> Result<Vec<CatalogEntry>, Error>;

    /// The owner's books, newest first. `None` returns every status.
    async fn owned_books(
        &self,
        owner: &UserId,
        status: Option<BookStatus>,
    ) -> Result<Vec<CatalogEntry>, Error>;

    /// Remove an available, unreferenced book owned by `actor`.
    async fn delete_book(&self, actor: &UserId, book_id: BookId) -> Result<(), Error>;
}
