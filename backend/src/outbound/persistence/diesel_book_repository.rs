//! PostgreSQL-backed `BookRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::{BookRepository, BookRepositoryError};
use crate::domain::{Book, BookId, BookStatus, CatalogEntry, ExchangeStatus, UserId, Username};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{BookRow, NewBookRow};
use super::pool::{DbPool, PoolError};
use super::schema::{books, exchanges, users};

/// Diesel-backed implementation of the catalog store.
#[derive(Clone)]
pub struct DieselBookRepository {
    pool: DbPool,
}

impl DieselBookRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> BookRepositoryError {
    map_pool_error(error, BookRepositoryError::connection)
}

impl From<DieselError> for BookRepositoryError {
    fn from(error: DieselError) -> Self {
        map_diesel_error(
            error,
            BookRepositoryError::query,
            BookRepositoryError::connection,
        )
    }
}

fn row_to_book(row: BookRow) -> Result<Book, BookRepositoryError> {
    row.into_domain().map_err(|message| {
        warn!(%message, "unreadable book row");
        BookRepositoryError::query(message)
    })
}

fn row_to_entry((row, owner): (BookRow, String)) -> Result<CatalogEntry, BookRepositoryError> {
    let owner = Username::new(&owner)
        .map_err(|err| BookRepositoryError::query(format!("book {}: owner {err}", row.id)))?;
    Ok(CatalogEntry {
        book: row_to_book(row)?,
        owner,
    })
}

#[async_trait]
impl BookRepository for DieselBookRepository {
    async fn insert(&self, book: &Book) -> Result<CatalogEntry, BookRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(books::table)
            .values(&NewBookRow::from_domain(book))
            .execute(&mut conn)
            .await?;

        let owner: String = users::table
            .find(*book.owner_id().as_uuid())
            .select(users::username)
            .first(&mut conn)
            .await?;
        let owner = Username::new(&owner)
            .map_err(|err| BookRepositoryError::query(format!("owner: {err}")))?;
        Ok(CatalogEntry {
            book: book.clone(),
            owner,
        })
    }

    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, BookRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<BookRow> = books::table
            .find(*id.as_uuid())
            .select(BookRow::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        row.map(row_to_book).transpose()
    }

    async fn list_available(
        &self,
        excluding_owner: Option<UserId>,
    ) -> Result<Vec<CatalogEntry>, BookRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let mut query = books::table
            .inner_join(users::table)
            .filter(books::status.eq(BookStatus::Available.as_str()))
            .select((BookRow::as_select(), users::username))
            .order(books::created_at.desc())
            .into_boxed();
        if let Some(owner) = excluding_owner {
            query = query.filter(books::owner_id.ne(*owner.as_uuid()));
        }

        let rows: Vec<(BookRow, String)> = query.load(&mut conn).await?;
        rows.into_iter().map(row_to_entry).collect()
    }

    async fn list_owned(
        &self,
        owner: &UserId,
        status: Option<BookStatus>,
    ) -> Result<Vec<CatalogEntry>, BookRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let mut query = books::table
            .inner_join(users::table)
            .filter(books::owner_id.eq(*owner.as_uuid()))
            .select((BookRow::as_select(), users::username))
            .order(books::created_at.desc())
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(books::status.eq(status.as_str()));
        }

        let rows: Vec<(BookRow, String)> = query.load(&mut conn).await?;
        rows.into_iter().map(row_to_entry).collect()
    }

    async fn set_status(&self, id: BookId, status: BookStatus) -> Result<bool, BookRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(books::table.find(*id.as_uuid()))
            .set(books::status.eq(status.as_str()))
            .execute(&mut conn)
            .await?;
        Ok(updated > 0)
    }

    async fn delete_available(&self, id: BookId) -> Result<Option<Book>, BookRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let book_id: Uuid = *id.as_uuid();

        conn.transaction::<_, BookRepositoryError, _>(|conn| {
            async move {
                let Some(row) = books::table
                    .find(book_id)
                    .select(BookRow::as_select())
                    .for_update()
                    .first::<BookRow>(conn)
                    .await
                    .optional()?
                else {
                    return Ok(None);
                };

                let pending_references: i64 = exchanges::table
                    .filter(exchanges::status.eq(ExchangeStatus::Pending.as_str()))
                    .filter(
                        exchanges::requested_book_id
                            .eq(book_id)
                            .or(exchanges::offered_book_id.eq(book_id)),
                    )
                    .count()
                    .get_result(conn)
                    .await?;
                if pending_references > 0 {
                    return Err(BookRepositoryError::referenced(book_id.to_string()));
                }
                let book = row_to_book(row)?;
                if !book.is_available() {
                    return Err(BookRepositoryError::not_available(book_id.to_string()));
                }

                diesel::delete(
                    exchanges::table.filter(
                        exchanges::requested_book_id
                            .eq(book_id)
                            .or(exchanges::offered_book_id.eq(book_id)),
                    ),
                )
                .execute(conn)
                .await?;
                diesel::delete(books::table.find(book_id))
                    .execute(conn)
                    .await?;
                Ok(Some(book))
            }
            .scope_boxed()
        })
        .await
    }
}
