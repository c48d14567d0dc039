//! Catalog use-cases: listing, browsing and removing books.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    BookRepository, BookRepositoryError, Catalog, ImageStore, ImageStoreError, NewListing,
};
use crate::domain::{Book, BookId, BookStatus, CatalogEntry, Error, UserId};

/// Service implementing the [`Catalog`] driving port.
#[derive(Clone)]
pub struct CatalogService<B, I: ?Sized> {
    books: Arc<B>,
    images: Arc<I>,
    clock: Arc<dyn Clock>,
}

impl<B, I: ?Sized> CatalogService<B, I> {
    pub fn new(books: Arc<B>, images: Arc<I>, clock: Arc<dyn Clock>) -> Self {
        Self {
            books,
            images,
            clock,
        }
    }
}

pub(crate) fn map_book_error(error: BookRepositoryError) -> Error {
    match error {
        BookRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("book repository unavailable: {message}"))
        }
        BookRepositoryError::Query { message } => {
            Error::internal(format!("book repository error: {message}"))
        }
        BookRepositoryError::Referenced { .. } => {
            Error::conflict("book is part of a pending exchange")
        }
        BookRepositoryError::NotAvailable { .. } => {
            Error::invalid_state("only available books can be deleted")
        }
    }
}

fn map_image_error(error: ImageStoreError) -> Error {
    match error {
        ImageStoreError::TooLarge { .. } => Error::invalid_request(error.to_string()),
        ImageStoreError::Io { message } => {
            Error::internal(format!("cover image could not be stored: {message}"))
        }
    }
}

#[async_trait]
impl<B, I> Catalog for CatalogService<B, I>
where
    B: BookRepository,
    I: ImageStore + ?Sized,
{
    async fn list_book(&self, owner: &UserId, listing: NewListing) -> Result<CatalogEntry, Error> {
        let NewListing { details, cover } = listing;
        let cover_image = match cover {
            Some(upload) => {
                let stored = self
                    .images
                    .store_image(&upload)
                    .await
                    .map_err(map_image_error)?;
                if stored.is_none() {
                    debug!(file_name = %upload.file_name, "cover upload declined");
                }
                stored
            }
            None => None,
        };

        let book = Book::new(
            BookId::random(),
            owner.clone(),
            details,
            BookStatus::Available,
            self.clock.utc(),
        )
        .with_cover_image(cover_image);
        let entry = match self.books.insert(&book).await {
            Ok(entry) => entry,
            Err(error) => {
                if let Some(cover) = book.cover_image() {
                    if let Err(cleanup) = self.images.remove_image(cover).await {
                        let image: &str = cover.as_ref();
                        warn!(error = %cleanup, image, "orphaned cover image");
                    }
                }
                return Err(map_book_error(error));
            }
        };
        info!(book_id = %book.id(), owner = %owner, "listed book");
        Ok(entry)
    }

    async fn browse(&self, viewer: Option<UserId>) -> Result<Vec<CatalogEntry>, Error> {
        self.books
            .list_available(viewer)
            .await
            .map_err(map_book_error)
    }

    async fn owned_books(
        &self,
        owner: &UserId,
        status: Option<BookStatus>,
    ) -> Result<Vec<CatalogEntry>, Error> {
        self.books
            .list_owned(owner, status)
            .await
            .map_err(map_book_error)
    }

    async fn delete_book(&self, actor: &UserId, book_id: BookId) -> Result<(), Error> {
        let book = self
            .books
            .find_by_id(book_id)
            .await
            .map_err(map_book_error)?
            .ok_or_else(|| Error::not_found("book not found"))?;
        if !book.is_owned_by(actor) {
            return Err(Error::forbidden("you don't own this book"));
        }

        let removed = self
            .books
            .delete_available(book_id)
            .await
            .map_err(map_book_error)?
            .ok_or_else(|| Error::not_found("book not found"))?;

        if let Some(cover) = removed.cover_image() {
            if let Err(error) = self.images.remove_image(cover).await {
                warn!(%error, book_id = %book_id, "failed to remove cover image");
            }
        }
        info!(book_id = %book_id, "deleted book");
        Ok(())
    }
}
