//! Driving port for proposing and deciding book exchanges.

use async_trait::async_trait;

use crate::domain::{
    BookDetails, BookId, Error, Exchange, ExchangeDecision, ExchangeId, ExchangeSummary, UserId,
};

/// What a requester offers in return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOffer {
    /// One of the requester's own available books.
    Existing(BookId),
    /// A book not yet listed, described inline.
    New(BookDetails),
}

/// Outcome of a decision, including proposals rejected by the cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionOutcome {
    pub exchange: Exchange,
    pub auto_rejected: Vec<ExchangeId>,
}

/// Exchange ledger use-cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Exchanges: Send + Sync {
    /// Propose trading `offer` for `requested_book_id`.
    async fn request_exchange(
        &self,
        requester: &UserId,
        requested_book_id: BookId,
        offer: ExchangeOffer,
    ) -> Result<Exchange, Error>;

    /// Accept or reject a pending proposal on a book `actor` owns.
    async fn update_exchange_status(
        &self,
        actor: &UserId,
        exchange_id: ExchangeId,
        decision: ExchangeDecision,
    ) -> Result<DecisionOutcome, Error>;

    /// Proposals the user sent or received, newest first.
    async fn list_exchanges(&self, user: &UserId) -> Result<Vec<ExchangeSummary>, Error>;
}
