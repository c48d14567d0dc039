//! Exchange proposals and the views listed to their participants.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::UserId;
use super::book::BookId;
use super::user::Username;

/// Identifier of an exchange proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeId(Uuid);

impl ExchangeId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle of a proposal. `Accepted` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ExchangeStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for ExchangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a status string is outside the fixed exchange set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown exchange status: {0}")]
pub struct UnknownExchangeStatus(pub String);

impl FromStr for ExchangeStatus {
    type Err = UnknownExchangeStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            other => Err(UnknownExchangeStatus(other.to_owned())),
        }
    }
}

/// Verdict the requested book's owner may record on a pending proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeDecision {
    Accept,
    Reject,
}

impl ExchangeDecision {
    /// Status the decided exchange ends up in.
    pub const fn resulting_status(self) -> ExchangeStatus {
        match self {
            Self::Accept => ExchangeStatus::Accepted,
            Self::Reject => ExchangeStatus::Rejected,
        }
    }
}

/// Raised for decision values other than `accepted` and `rejected`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("decision must be `accepted` or `rejected`, got `{0}`")]
pub struct InvalidDecision(pub String);

impl FromStr for ExchangeDecision {
    type Err = InvalidDecision;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accepted" => Ok(Self::Accept),
            "rejected" => Ok(Self::Reject),
            other => Err(InvalidDecision(other.to_owned())),
        }
    }
}

/// A single trade proposal.
///
/// ## Invariants
/// - The requester never owns the requested book at creation time.
/// - While `Pending`, the offered book is `Pending` too; once terminal the
///   offered book is `Available` or `Exchanged`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub id: ExchangeId,
    pub requested_book_id: BookId,
    pub requester_id: UserId,
    pub offered_book_id: BookId,
    pub status: ExchangeStatus,
    pub created_at: DateTime<Utc>,
}

impl Exchange {
    pub fn is_pending(&self) -> bool {
        self.status == ExchangeStatus::Pending
    }

    /// Whether either side of this proposal is one of `books`.
    pub fn touches_any(&self, books: &[BookId]) -> bool {
        books.contains(&self.requested_book_id) || books.contains(&self.offered_book_id)
    }
}

/// Row of the "my exchanges" listing, as seen by one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeSummary {
    pub id: ExchangeId,
    pub requested_book_title: String,
    pub requested_book_author: String,
    pub requester: Username,
    pub owner: Username,
    pub offered_book_title: String,
    pub offered_book_author: String,
    pub status: ExchangeStatus,
    pub created_at: DateTime<Utc>,
    /// True when the viewer owns the requested book and may decide it.
    pub is_owner: bool,
}
