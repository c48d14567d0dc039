//! PostgreSQL-backed `ExchangeLedgerRepository` implementation using Diesel ORM.
//!
//! Each ledger operation runs in one `SERIALIZABLE` transaction. Rows the
//! planner reads are locked with `SELECT ... FOR UPDATE`, the pure planner
//! from `domain::ledger` decides, and the resulting plan is applied before
//! commit. A planner rejection rolls the transaction back untouched.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::warn;
use uuid::Uuid;

use crate::domain::ledger::{OfferedBookChange, plan_decision, plan_request};
use crate::domain::ports::{ExchangeLedgerRepository, ExchangeLedgerRepositoryError};
use crate::domain::{
    Book, BookStatus, DecisionPlan, DecisionRequest, Exchange, ExchangeProposal,
    ExchangeStatus, ExchangeSummary, UserId, Username,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{BookRow, ExchangeRow, NewBookRow, NewExchangeRow};
use super::pool::{DbPool, PoolError};
use super::schema::{books, exchanges, users};

/// Diesel-backed implementation of the exchange ledger.
#[derive(Clone)]
pub struct DieselExchangeLedgerRepository {
    pool: DbPool,
}

impl DieselExchangeLedgerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> ExchangeLedgerRepositoryError {
    map_pool_error(error, ExchangeLedgerRepositoryError::connection)
}

impl From<DieselError> for ExchangeLedgerRepositoryError {
    fn from(error: DieselError) -> Self {
        map_diesel_error(
            error,
            ExchangeLedgerRepositoryError::query,
            ExchangeLedgerRepositoryError::connection,
        )
    }
}

fn unreadable(message: String) -> ExchangeLedgerRepositoryError {
    warn!(%message, "unreadable ledger row");
    ExchangeLedgerRepositoryError::query(message)
}

async fn lock_book(
    conn: &mut AsyncPgConnection,
    id: Uuid,
) -> Result<Option<Book>, ExchangeLedgerRepositoryError> {
    let row: Option<BookRow> = books::table
        .find(id)
        .select(BookRow::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()?;
    row.map(|row| row.into_domain().map_err(unreadable))
        .transpose()
}

async fn set_book_status(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    status: BookStatus,
) -> Result<(), ExchangeLedgerRepositoryError> {
    diesel::update(books::table.find(id))
        .set(books::status.eq(status.as_str()))
        .execute(conn)
        .await?;
    Ok(())
}

async fn apply_request(
    conn: &mut AsyncPgConnection,
    proposal: &ExchangeProposal,
) -> Result<Exchange, ExchangeLedgerRepositoryError> {
    let requested = lock_book(conn, *proposal.requested_book_id.as_uuid()).await?;
    let offered = match proposal.existing_offer() {
        Some(id) => lock_book(conn, *id.as_uuid()).await?,
        None => None,
    };

    let plan = plan_request(proposal, requested.as_ref(), offered.as_ref())?;
    match &plan.offered {
        OfferedBookChange::Reserve(id) => {
            set_book_status(conn, *id.as_uuid(), BookStatus::Pending).await?;
        }
        OfferedBookChange::Create(book) => {
            diesel::insert_into(books::table)
                .values(&NewBookRow::from_domain(book))
                .execute(conn)
                .await?;
        }
    }
    diesel::insert_into(exchanges::table)
        .values(&NewExchangeRow::from_domain(&plan.exchange))
        .execute(conn)
        .await?;
    Ok(plan.exchange)
}

async fn apply_decision(
    conn: &mut AsyncPgConnection,
    request: &DecisionRequest,
) -> Result<DecisionPlan, ExchangeLedgerRepositoryError> {
    let row: Option<ExchangeRow> = exchanges::table
        .find(*request.exchange_id.as_uuid())
        .select(ExchangeRow::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()?;
    let exchange = row.map(|row| row.into_domain().map_err(unreadable)).transpose()?;

    let (requested_owner, candidates) = match &exchange {
        Some(exchange) => {
            let traded = [
                *exchange.requested_book_id.as_uuid(),
                *exchange.offered_book_id.as_uuid(),
            ];
            let owner: Option<Uuid> = books::table
                .find(traded[0])
                .select(books::owner_id)
                .for_update()
                .first(conn)
                .await
                .optional()?;
            let rows: Vec<ExchangeRow> = exchanges::table
                .filter(exchanges::status.eq(ExchangeStatus::Pending.as_str()))
                .filter(
                    exchanges::requested_book_id
                        .eq_any(traded)
                        .or(exchanges::offered_book_id.eq_any(traded)),
                )
                .select(ExchangeRow::as_select())
                .for_update()
                .load(conn)
                .await?;
            let candidates = rows
                .into_iter()
                .map(|row| row.into_domain().map_err(unreadable))
                .collect::<Result<Vec<_>, _>>()?;
            (owner.map(UserId::from_uuid), candidates)
        }
        None => (None, Vec::new()),
    };

    let plan = plan_decision(
        request,
        exchange.as_ref(),
        requested_owner.as_ref(),
        &candidates,
    )?;

    for (book_id, status) in &plan.book_updates {
        set_book_status(conn, *book_id.as_uuid(), *status).await?;
    }
    if !plan.auto_rejected.is_empty() {
        let ids: Vec<Uuid> = plan.auto_rejected.iter().map(|id| *id.as_uuid()).collect();
        diesel::update(exchanges::table.filter(exchanges::id.eq_any(ids)))
            .set(exchanges::status.eq(ExchangeStatus::Rejected.as_str()))
            .execute(conn)
            .await?;
    }
    diesel::update(exchanges::table.find(*plan.exchange.id.as_uuid()))
        .set(exchanges::status.eq(plan.exchange.status.as_str()))
        .execute(conn)
        .await?;
    Ok(plan)
}

/// Assemble per-viewer summaries from exchanges plus the rows they reference.
fn summarise(
    viewer: &UserId,
    rows: Vec<ExchangeRow>,
    books: &HashMap<Uuid, BookRow>,
    usernames: &HashMap<Uuid, String>,
) -> Result<Vec<ExchangeSummary>, ExchangeLedgerRepositoryError> {
    let username = |id: &Uuid| -> Result<Username, ExchangeLedgerRepositoryError> {
        let raw = usernames
            .get(id)
            .ok_or_else(|| unreadable(format!("user {id} missing")))?;
        Username::new(raw).map_err(|err| unreadable(format!("user {id}: {err}")))
    };
    let book = |id: &Uuid| {
        books
            .get(id)
            .ok_or_else(|| unreadable(format!("book {id} missing")))
    };

    rows.into_iter()
        .map(|row| {
            let requested = book(&row.requested_book_id)?;
            let offered = book(&row.offered_book_id)?;
            let exchange = row.into_domain().map_err(unreadable)?;
            Ok(ExchangeSummary {
                id: exchange.id,
                requested_book_title: requested.title.clone(),
                requested_book_author: requested.author.clone(),
                requester: username(exchange.requester_id.as_uuid())?,
                owner: username(&requested.owner_id)?,
                offered_book_title: offered.title.clone(),
                offered_book_author: offered.author.clone(),
                status: exchange.status,
                created_at: exchange.created_at,
                is_owner: &requested.owner_id == viewer.as_uuid(),
            })
        })
        .collect()
}

#[async_trait]
impl ExchangeLedgerRepository for DieselExchangeLedgerRepository {
    async fn request_exchange(
        &self,
        proposal: &ExchangeProposal,
    ) -> Result<Exchange, ExchangeLedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        conn.build_transaction()
            .serializable()
            .run(|conn| async move { apply_request(conn, proposal).await }.scope_boxed())
            .await
    }

    async fn decide(
        &self,
        request: &DecisionRequest,
    ) -> Result<DecisionPlan, ExchangeLedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        conn.build_transaction()
            .serializable()
            .run(|conn| async move { apply_decision(conn, request).await }.scope_boxed())
            .await
    }

    async fn list_for_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<ExchangeSummary>, ExchangeLedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let viewer = *user.as_uuid();
        let owned_books = books::table
            .filter(books::owner_id.eq(viewer))
            .select(books::id);
        let rows: Vec<ExchangeRow> = exchanges::table
            .filter(
                exchanges::requester_id
                    .eq(viewer)
                    .or(exchanges::requested_book_id.eq_any(owned_books)),
            )
            .select(ExchangeRow::as_select())
            .order(exchanges::created_at.desc())
            .load(&mut conn)
            .await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let book_ids: HashSet<Uuid> = rows
            .iter()
            .flat_map(|row| [row.requested_book_id, row.offered_book_id])
            .collect();
        let book_rows: Vec<BookRow> = books::table
            .filter(books::id.eq_any(book_ids.into_iter().collect::<Vec<_>>()))
            .select(BookRow::as_select())
            .load(&mut conn)
            .await?;
        let book_map: HashMap<Uuid, BookRow> =
            book_rows.into_iter().map(|row| (row.id, row)).collect();

        let user_ids: HashSet<Uuid> = rows
            .iter()
            .map(|row| row.requester_id)
            .chain(book_map.values().map(|row| row.owner_id))
            .collect();
        let names: Vec<(Uuid, String)> = users::table
            .filter(users::id.eq_any(user_ids.into_iter().collect::<Vec<_>>()))
            .select((users::id, users::username))
            .load(&mut conn)
            .await?;
        let usernames: HashMap<Uuid, String> = names.into_iter().collect();

        summarise(user, rows, &book_map, &usernames)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for summary assembly and error mapping.
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    fn book_row(id: Uuid, owner: Uuid, title: &str) -> BookRow {
        BookRow {
            id,
            owner_id: owner,
            title: title.to_owned(),
            author: "Anon".to_owned(),
            description: None,
            status: "pending".to_owned(),
            cover_image: None,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn summaries_flag_the_requested_owner() {
        let (owner, requester) = (Uuid::new_v4(), Uuid::new_v4());
        let (wanted, offered) = (Uuid::new_v4(), Uuid::new_v4());
        let rows = vec![ExchangeRow {
            id: Uuid::new_v4(),
            requested_book_id: wanted,
            requester_id: requester,
            offered_book_id: offered,
            status: "pending".to_owned(),
            created_at: Utc::now(),
        }];
        let books = HashMap::from([
            (wanted, book_row(wanted, owner, "Wanted")),
            (offered, book_row(offered, requester, "Offered")),
        ]);
        let usernames = HashMap::from([
            (owner, "olive".to_owned()),
            (requester, "rory".to_owned()),
        ]);

        let as_owner = summarise(&UserId::from_uuid(owner), rows.clone(), &books, &usernames)
            .expect("summaries");
        let as_requester = summarise(&UserId::from_uuid(requester), rows, &books, &usernames)
            .expect("summaries");

        assert!(as_owner[0].is_owner);
        assert!(!as_requester[0].is_owner);
        assert_eq!(as_owner[0].owner.as_ref(), "olive");
        assert_eq!(as_owner[0].requester.as_ref(), "rory");
        assert_eq!(as_owner[0].offered_book_title, "Offered");
        assert_eq!(as_owner[0].status, ExchangeStatus::Pending);
    }

    #[rstest]
    fn missing_books_are_query_errors() {
        let rows = vec![ExchangeRow {
            id: Uuid::new_v4(),
            requested_book_id: Uuid::new_v4(),
            requester_id: Uuid::new_v4(),
            offered_book_id: Uuid::new_v4(),
            status: "pending".to_owned(),
            created_at: Utc::now(),
        }];
        let err = summarise(&UserId::random(), rows, &HashMap::new(), &HashMap::new())
            .expect_err("dangling references");
        assert!(matches!(err, ExchangeLedgerRepositoryError::Query { .. }));
    }

    #[rstest]
    fn closed_connections_map_to_connection_errors() {
        use diesel::result::DatabaseErrorKind;
        let err = ExchangeLedgerRepositoryError::from(DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("closed".to_owned()),
        ));
        assert!(matches!(err, ExchangeLedgerRepositoryError::Connection { .. }));
    }
}
