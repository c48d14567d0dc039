//! Exchange ledger state machine.
//!
//! Every rule governing how a proposal and the books it references move
//! between statuses lives here as pure planning functions. Storage adapters
//! load the rows an operation touches while holding their lock or
//! transaction, ask this module for a plan, then write the plan back in the
//! same unit. A [`LedgerRejection`] means nothing may be written.
//!
//! ```text
//!             request_exchange
//!   (none) ──────────────────────▶ pending ──accept──▶ accepted
//!                                     │
//!                                     └──reject / cascade──▶ rejected
//! ```

use chrono::{DateTime, Utc};

use super::UserId;
use super::book::{Book, BookDetails, BookId, BookStatus};
use super::exchange::{Exchange, ExchangeDecision, ExchangeId, ExchangeStatus};

/// Rule violation detected while planning a ledger operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LedgerRejection {
    #[error("requested book not found")]
    RequestedBookNotFound,
    #[error("requested book is not available for exchange")]
    RequestedBookUnavailable,
    #[error("you cannot request your own book")]
    SelfTrade,
    #[error("offered book not found")]
    OfferedBookNotFound,
    #[error("you don't own the offered book")]
    OfferedBookNotOwned,
    #[error("offered book is not available for exchange")]
    OfferedBookUnavailable,
    #[error("exchange not found")]
    ExchangeNotFound,
    #[error("only the owner of the requested book may decide this exchange")]
    NotRequestedBookOwner,
    #[error("exchange is already {status}")]
    ExchangeNotPending { status: ExchangeStatus },
}

/// Coarse category of a [`LedgerRejection`], used to pick an error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    NotFound,
    Forbidden,
    InvalidState,
}

impl LedgerRejection {
    pub const fn kind(self) -> RejectionKind {
        match self {
            Self::RequestedBookNotFound | Self::OfferedBookNotFound | Self::ExchangeNotFound => {
                RejectionKind::NotFound
            }
            Self::SelfTrade | Self::OfferedBookNotOwned | Self::NotRequestedBookOwner => {
                RejectionKind::Forbidden
            }
            Self::RequestedBookUnavailable
            | Self::OfferedBookUnavailable
            | Self::ExchangeNotPending { .. } => RejectionKind::InvalidState,
        }
    }
}

/// What the requester stakes in return for the requested book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposedOffer {
    /// One of the requester's listed books.
    Existing(BookId),
    /// A book not yet listed; created for this proposal only.
    New { book_id: BookId, details: BookDetails },
}

/// Fully identified proposal, ready to be planned.
///
/// Identifiers and the timestamp are minted by the caller so planning stays
/// deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeProposal {
    pub exchange_id: ExchangeId,
    pub requester: UserId,
    pub requested_book_id: BookId,
    pub offer: ProposedOffer,
    pub created_at: DateTime<Utc>,
}

impl ExchangeProposal {
    /// Existing book the adapter must load, if any.
    pub fn existing_offer(&self) -> Option<BookId> {
        match &self.offer {
            ProposedOffer::Existing(id) => Some(*id),
            ProposedOffer::New { .. } => None,
        }
    }
}

/// Change to apply to the offered side of a new proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfferedBookChange {
    /// Move an existing `available` book to `pending`.
    Reserve(BookId),
    /// Insert a freshly described book, already `pending`.
    Create(Book),
}

/// Writes produced by [`plan_request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPlan {
    pub offered: OfferedBookChange,
    pub exchange: Exchange,
}

/// Plan a new proposal.
///
/// Checks run in this order: the requested book exists and is available, the
/// requester does not own it, then the existing offered book (if any) exists,
/// belongs to the requester and is available.
///
/// `offered` is only consulted for [`ProposedOffer::Existing`].
pub fn plan_request(
    proposal: &ExchangeProposal,
    requested: Option<&Book>,
    offered: Option<&Book>,
) -> Result<RequestPlan, LedgerRejection> {
    let requested = requested.ok_or(LedgerRejection::RequestedBookNotFound)?;
    if !requested.is_available() {
        return Err(LedgerRejection::RequestedBookUnavailable);
    }
    if requested.is_owned_by(&proposal.requester) {
        return Err(LedgerRejection::SelfTrade);
    }

    let (offered_change, offered_book_id) = match &proposal.offer {
        ProposedOffer::Existing(_) => {
            let book = offered.ok_or(LedgerRejection::OfferedBookNotFound)?;
            if !book.is_owned_by(&proposal.requester) {
                return Err(LedgerRejection::OfferedBookNotOwned);
            }
            if !book.is_available() {
                return Err(LedgerRejection::OfferedBookUnavailable);
            }
            (OfferedBookChange::Reserve(book.id()), book.id())
        }
        ProposedOffer::New { book_id, details } => {
            let book = Book::new(
                *book_id,
                proposal.requester.clone(),
                details.clone(),
                BookStatus::Pending,
                proposal.created_at,
            );
            (OfferedBookChange::Create(book), *book_id)
        }
    };

    Ok(RequestPlan {
        offered: offered_change,
        exchange: Exchange {
            id: proposal.exchange_id,
            requested_book_id: requested.id(),
            requester_id: proposal.requester.clone(),
            offered_book_id,
            status: ExchangeStatus::Pending,
            created_at: proposal.created_at,
        },
    })
}

/// A verdict on a proposal by the user acting on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionRequest {
    pub actor: UserId,
    pub exchange_id: ExchangeId,
    pub decision: ExchangeDecision,
}

/// Writes produced by [`plan_decision`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionPlan {
    /// The decided exchange with its new terminal status.
    pub exchange: Exchange,
    /// Book status assignments, applied in order.
    pub book_updates: Vec<(BookId, BookStatus)>,
    /// Competing proposals moved to `rejected` by an acceptance.
    pub auto_rejected: Vec<ExchangeId>,
}

/// Plan a decision on a proposal.
///
/// `requested_owner` is the current owner of the exchange's requested book.
/// `candidates` should hold every `pending` exchange touching either of the
/// decided exchange's books; the planner filters out the exchange itself and
/// anything no longer pending, so a wider set is harmless.
///
/// On acceptance both books become `exchanged` and each competing proposal
/// is rejected. A competing proposal's offered book goes back to `available`
/// unless it is one of the two books just exchanged. Its requested book is
/// left as it is.
pub fn plan_decision(
    request: &DecisionRequest,
    exchange: Option<&Exchange>,
    requested_owner: Option<&UserId>,
    candidates: &[Exchange],
) -> Result<DecisionPlan, LedgerRejection> {
    let exchange = exchange.ok_or(LedgerRejection::ExchangeNotFound)?;
    if requested_owner != Some(&request.actor) {
        return Err(LedgerRejection::NotRequestedBookOwner);
    }
    if !exchange.is_pending() {
        return Err(LedgerRejection::ExchangeNotPending {
            status: exchange.status,
        });
    }

    let mut decided = exchange.clone();
    decided.status = request.decision.resulting_status();

    let plan = match request.decision {
        ExchangeDecision::Reject => DecisionPlan {
            book_updates: vec![(exchange.offered_book_id, BookStatus::Available)],
            exchange: decided,
            auto_rejected: Vec::new(),
        },
        ExchangeDecision::Accept => {
            let traded = [exchange.requested_book_id, exchange.offered_book_id];
            let mut book_updates = vec![
                (exchange.requested_book_id, BookStatus::Exchanged),
                (exchange.offered_book_id, BookStatus::Exchanged),
            ];
            let mut auto_rejected = Vec::new();
            for other in candidates
                .iter()
                .filter(|other| other.id != exchange.id && other.is_pending())
                .filter(|other| other.touches_any(&traded))
            {
                auto_rejected.push(other.id);
                if !traded.contains(&other.offered_book_id) {
                    book_updates.push((other.offered_book_id, BookStatus::Available));
                }
            }
            DecisionPlan {
                exchange: decided,
                book_updates,
                auto_rejected,
            }
        }
    };
    Ok(plan)
}

#[cfg(test)]
mod tests;
