//! Process-local marketplace store.
//!
//! A single mutex guards users, books and exchanges together, so every ledger
//! operation observes and mutates a consistent snapshot. Used when no database
//! URL is configured and by the behaviour tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ledger::{OfferedBookChange, plan_decision, plan_request};
use crate::domain::ports::{
    BookRepository, BookRepositoryError, ExchangeLedgerRepository, ExchangeLedgerRepositoryError,
    UserPersistenceError, UserRecord, UserRepository,
};
use crate::domain::{
    Book, BookId, BookStatus, CatalogEntry, DecisionPlan, DecisionRequest, Exchange, ExchangeId,
    ExchangeProposal, ExchangeStatus, ExchangeSummary, PasswordHash, User, UserId, Username,
};

struct Sequenced<T> {
    seq: u64,
    value: T,
}

#[derive(Default)]
struct MarketplaceState {
    users: HashMap<UserId, UserRecord>,
    books: HashMap<BookId, Sequenced<Book>>,
    exchanges: HashMap<ExchangeId, Sequenced<Exchange>>,
    next_seq: u64,
}

impl MarketplaceState {
    fn bump(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn username_of(&self, id: &UserId) -> Option<Username> {
        self.users.get(id).map(|record| record.user.username().clone())
    }

    fn book(&self, id: BookId) -> Option<&Book> {
        self.books.get(&id).map(|stored| &stored.value)
    }

    fn entry(&self, book: &Book) -> Option<CatalogEntry> {
        let owner = self.username_of(book.owner_id())?;
        Some(CatalogEntry {
            book: book.clone(),
            owner,
        })
    }

    /// Catalog entries matching `keep`, newest first.
    fn entries(&self, keep: impl Fn(&Book) -> bool) -> Vec<CatalogEntry> {
        let mut matched: Vec<&Sequenced<Book>> =
            self.books.values().filter(|stored| keep(&stored.value)).collect();
        matched.sort_by(|a, b| {
            b.value
                .created_at()
                .cmp(&a.value.created_at())
                .then(b.seq.cmp(&a.seq))
        });
        matched
            .into_iter()
            .filter_map(|stored| self.entry(&stored.value))
            .collect()
    }

    fn set_book_status(&mut self, id: BookId, status: BookStatus) -> bool {
        match self.books.get_mut(&id) {
            Some(stored) => {
                stored.value.set_status(status);
                true
            }
            None => false,
        }
    }

    fn summary(&self, exchange: &Exchange, viewer: &UserId) -> Option<ExchangeSummary> {
        let requested = self.book(exchange.requested_book_id)?;
        let offered = self.book(exchange.offered_book_id)?;
        Some(ExchangeSummary {
            id: exchange.id,
            requested_book_title: requested.title().to_owned(),
            requested_book_author: requested.author().to_owned(),
            requester: self.username_of(&exchange.requester_id)?,
            owner: self.username_of(requested.owner_id())?,
            offered_book_title: offered.title().to_owned(),
            offered_book_author: offered.author().to_owned(),
            status: exchange.status,
            created_at: exchange.created_at,
            is_owner: requested.is_owned_by(viewer),
        })
    }
}

/// In-memory implementation of the user, book and ledger repositories.
#[derive(Default)]
pub struct InMemoryMarketplace {
    state: Mutex<MarketplaceState>,
}

impl InMemoryMarketplace {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MarketplaceState>, String> {
        self.state
            .lock()
            .map_err(|_| "marketplace state lock poisoned".to_owned())
    }
}

#[async_trait]
impl UserRepository for InMemoryMarketplace {
    async fn create(&self, record: &UserRecord) -> Result<(), UserPersistenceError> {
        let mut state = self.lock().map_err(UserPersistenceError::query)?;
        let username = record.user.username();
        if state
            .users
            .values()
            .any(|existing| existing.user.username() == username)
        {
            return Err(UserPersistenceError::duplicate_username(username.as_ref()));
        }
        if let Some(email) = record.user.email() {
            if state
                .users
                .values()
                .any(|existing| existing.user.email() == Some(email))
            {
                return Err(UserPersistenceError::duplicate_email(email.as_ref()));
            }
        }
        state.users.insert(record.user.id().clone(), record.clone());
        Ok(())
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, UserPersistenceError> {
        let state = self.lock().map_err(UserPersistenceError::query)?;
        Ok(state
            .users
            .values()
            .find(|record| record.user.username().as_ref() == username)
            .cloned())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, UserPersistenceError> {
        let state = self.lock().map_err(UserPersistenceError::query)?;
        Ok(state.users.get(id).cloned())
    }

    async fn update(
        &self,
        user: &User,
        password_hash: Option<PasswordHash>,
    ) -> Result<(), UserPersistenceError> {
        let mut state = self.lock().map_err(UserPersistenceError::query)?;
        if let Some(email) = user.email() {
            if state
                .users
                .values()
                .any(|other| other.user.id() != user.id() && other.user.email() == Some(email))
            {
                return Err(UserPersistenceError::duplicate_email(email.as_ref()));
            }
        }
        let record = state
            .users
            .get_mut(user.id())
            .ok_or_else(|| UserPersistenceError::query(format!("user {} not found", user.id())))?;
        record.user = user.clone();
        if let Some(hash) = password_hash {
            record.password_hash = hash;
        }
        Ok(())
    }
}

#[async_trait]
impl BookRepository for InMemoryMarketplace {
    async fn insert(&self, book: &Book) -> Result<CatalogEntry, BookRepositoryError> {
        let mut state = self.lock().map_err(BookRepositoryError::query)?;
        let owner = state.username_of(book.owner_id()).ok_or_else(|| {
            BookRepositoryError::query(format!("owner {} not found", book.owner_id()))
        })?;
        let seq = state.bump();
        state.books.insert(
            book.id(),
            Sequenced {
                seq,
                value: book.clone(),
            },
        );
        Ok(CatalogEntry {
            book: book.clone(),
            owner,
        })
    }

    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, BookRepositoryError> {
        let state = self.lock().map_err(BookRepositoryError::query)?;
        Ok(state.book(id).cloned())
    }

    async fn list_available(
        &self,
        excluding_owner: Option<UserId>,
    ) -> Result<Vec<CatalogEntry>, BookRepositoryError> {
        let state = self.lock().map_err(BookRepositoryError::query)?;
        Ok(state.entries(|book| {
            book.is_available()
                && excluding_owner
                    .as_ref()
                    .is_none_or(|owner| !book.is_owned_by(owner))
        }))
    }

    async fn list_owned(
        &self,
        owner: &UserId,
        status: Option<BookStatus>,
    ) -> Result<Vec<CatalogEntry>, BookRepositoryError> {
        let state = self.lock().map_err(BookRepositoryError::query)?;
        Ok(state.entries(|book| {
            book.is_owned_by(owner) && status.is_none_or(|wanted| book.status() == wanted)
        }))
    }

    async fn set_status(&self, id: BookId, status: BookStatus) -> Result<bool, BookRepositoryError> {
        let mut state = self.lock().map_err(BookRepositoryError::query)?;
        Ok(state.set_book_status(id, status))
    }

    async fn delete_available(&self, id: BookId) -> Result<Option<Book>, BookRepositoryError> {
        let mut state = self.lock().map_err(BookRepositoryError::query)?;
        let Some(book) = state.book(id) else {
            return Ok(None);
        };
        let referenced = state
            .exchanges
            .values()
            .any(|stored| stored.value.is_pending() && stored.value.touches_any(&[id]));
        if referenced {
            return Err(BookRepositoryError::referenced(id.to_string()));
        }
        if !book.is_available() {
            return Err(BookRepositoryError::not_available(id.to_string()));
        }

        state
            .exchanges
            .retain(|_, stored| !stored.value.touches_any(&[id]));
        Ok(state.books.remove(&id).map(|stored| stored.value))
    }
}

#[async_trait]
impl ExchangeLedgerRepository for InMemoryMarketplace {
    async fn request_exchange(
        &self,
        proposal: &ExchangeProposal,
    ) -> Result<Exchange, ExchangeLedgerRepositoryError> {
        let mut state = self.lock().map_err(ExchangeLedgerRepositoryError::query)?;
        let plan = plan_request(
            proposal,
            state.book(proposal.requested_book_id),
            proposal.existing_offer().and_then(|id| state.book(id)),
        )?;

        match plan.offered {
            OfferedBookChange::Reserve(id) => {
                state.set_book_status(id, BookStatus::Pending);
            }
            OfferedBookChange::Create(book) => {
                let seq = state.bump();
                state.books.insert(book.id(), Sequenced { seq, value: book });
            }
        }
        let seq = state.bump();
        state.exchanges.insert(
            plan.exchange.id,
            Sequenced {
                seq,
                value: plan.exchange.clone(),
            },
        );
        Ok(plan.exchange)
    }

    async fn decide(
        &self,
        request: &DecisionRequest,
    ) -> Result<DecisionPlan, ExchangeLedgerRepositoryError> {
        let mut state = self.lock().map_err(ExchangeLedgerRepositoryError::query)?;
        let exchange = state
            .exchanges
            .get(&request.exchange_id)
            .map(|stored| stored.value.clone());
        let requested_owner = exchange
            .as_ref()
            .and_then(|exchange| state.book(exchange.requested_book_id))
            .map(|book| book.owner_id().clone());
        let candidates: Vec<Exchange> = state
            .exchanges
            .values()
            .filter(|stored| stored.value.is_pending())
            .map(|stored| stored.value.clone())
            .collect();

        let plan = plan_decision(
            request,
            exchange.as_ref(),
            requested_owner.as_ref(),
            &candidates,
        )?;

        for (book_id, status) in &plan.book_updates {
            if !state.set_book_status(*book_id, *status) {
                debug!(book_id = %book_id, "ledger update skipped missing book");
            }
        }
        for id in &plan.auto_rejected {
            if let Some(stored) = state.exchanges.get_mut(id) {
                stored.value.status = ExchangeStatus::Rejected;
            }
        }
        if let Some(stored) = state.exchanges.get_mut(&plan.exchange.id) {
            stored.value.status = plan.exchange.status;
        }
        Ok(plan)
    }

    async fn list_for_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<ExchangeSummary>, ExchangeLedgerRepositoryError> {
        let state = self.lock().map_err(ExchangeLedgerRepositoryError::query)?;
        let mut involved: Vec<&Sequenced<Exchange>> = state
            .exchanges
            .values()
            .filter(|stored| {
                let exchange = &stored.value;
                &exchange.requester_id == user
                    || state
                        .book(exchange.requested_book_id)
                        .is_some_and(|book| book.is_owned_by(user))
            })
            .collect();
        involved.sort_by(|a, b| {
            b.value
                .created_at
                .cmp(&a.value.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(involved
            .into_iter()
            .filter_map(|stored| state.summary(&stored.value, user))
            .collect())
    }
}
