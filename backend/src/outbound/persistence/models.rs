//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{Book, BookDetails, BookId, Exchange, ExchangeId, ImageRef, UserId};

use super::schema::{books, exchanges, users};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub password_hash: &'a str,
    pub email: Option<&'a str>,
    pub location: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

/// Changeset for profile updates. `None` on `password_hash` leaves it as is,
/// while `email` and `location` are always written (NULL clears them).
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserContactUpdate<'a> {
    pub email: Option<&'a str>,
    pub location: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Books
// ---------------------------------------------------------------------------

/// Row struct for reading from the books table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = books)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BookRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub status: String,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BookRow {
    /// Convert into the domain book, reporting rows that violate its rules.
    pub(crate) fn into_domain(self) -> Result<Book, String> {
        let status = self
            .status
            .parse()
            .map_err(|err| format!("book {}: {err}", self.id))?;
        let details = BookDetails::try_new(&self.title, &self.author, self.description.as_deref())
            .map_err(|err| format!("book {}: {err}", self.id))?;
        Ok(Book::new(
            BookId::from_uuid(self.id),
            UserId::from_uuid(self.owner_id),
            details,
            status,
            self.created_at,
        )
        .with_cover_image(self.cover_image.map(ImageRef::new)))
    }
}

impl<'a> NewBookRow<'a> {
    pub(crate) fn from_domain(book: &'a Book) -> Self {
        Self {
            id: *book.id().as_uuid(),
            owner_id: *book.owner_id().as_uuid(),
            title: book.title(),
            author: book.author(),
            description: book.details().description(),
            status: book.status().as_str(),
            cover_image: book.cover_image().map(AsRef::as_ref),
            created_at: book.created_at(),
        }
    }
}

/// Insertable struct for listing a book or staking a new offer.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = books)]
pub(crate) struct NewBookRow<'a> {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: &'a str,
    pub author: &'a str,
    pub description: Option<&'a str>,
    pub status: &'a str,
    pub cover_image: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Exchanges
// ---------------------------------------------------------------------------

/// Row struct for reading from the exchanges table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = exchanges)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ExchangeRow {
    pub id: Uuid,
    pub requested_book_id: Uuid,
    pub requester_id: Uuid,
    pub offered_book_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl ExchangeRow {
    pub(crate) fn into_domain(self) -> Result<Exchange, String> {
        let status = self
            .status
            .parse()
            .map_err(|err| format!("exchange {}: {err}", self.id))?;
        Ok(Exchange {
            id: ExchangeId::from_uuid(self.id),
            requested_book_id: BookId::from_uuid(self.requested_book_id),
            requester_id: UserId::from_uuid(self.requester_id),
            offered_book_id: BookId::from_uuid(self.offered_book_id),
            status,
            created_at: self.created_at,
        })
    }
}

impl<'a> NewExchangeRow<'a> {
    pub(crate) fn from_domain(exchange: &'a Exchange) -> Self {
        Self {
            id: *exchange.id.as_uuid(),
            requested_book_id: *exchange.requested_book_id.as_uuid(),
            requester_id: *exchange.requester_id.as_uuid(),
            offered_book_id: *exchange.offered_book_id.as_uuid(),
            status: exchange.status.as_str(),
            created_at: exchange.created_at,
        }
    }
}

/// Insertable struct for recording a proposal.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = exchanges)]
pub(crate) struct NewExchangeRow<'a> {
    pub id: Uuid,
    pub requested_book_id: Uuid,
    pub requester_id: Uuid,
    pub offered_book_id: Uuid,
    pub status: &'a str,
    pub created_at: DateTime<Utc>,
}
