//! Exchange ledger persistence port.
//!
//! Each mutating call is one atomic unit: adapters load the rows the
//! operation touches under a lock or transaction, run the planner from
//! [`crate::domain::ledger`], and either apply the whole plan or nothing.

use async_trait::async_trait;

use crate::domain::{
    DecisionPlan, DecisionRequest, Exchange, ExchangeProposal, ExchangeSummary, LedgerRejection,
    UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by exchange ledger adapters.
    pub enum ExchangeLedgerRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "exchange ledger connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "exchange ledger query failed: {message}",
        /// A ledger rule refused the operation; nothing was written.
        Rejected { rejection: LedgerRejection } => "exchange ledger rejected operation: {rejection}",
    }
}

impl From<LedgerRejection> for ExchangeLedgerRepositoryError {
    fn from(rejection: LedgerRejection) -> Self {
        Self::Rejected { rejection }
    }
}

/// Storage side of the exchange state machine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExchangeLedgerRepository: Send + Sync {
    /// Plan and record a new proposal, reserving or creating the offered book.
    async fn request_exchange(
        &self,
        proposal: &ExchangeProposal,
    ) -> Result<Exchange, ExchangeLedgerRepositoryError>;

    /// Plan and record a decision, including the acceptance cascade.
    async fn decide(
        &self,
        request: &DecisionRequest,
    ) -> Result<DecisionPlan, ExchangeLedgerRepositoryError>;

    /// Exchanges the user requested or received, newest first.
    async fn list_for_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<ExchangeSummary>, ExchangeLedgerRepositoryError>;
}
