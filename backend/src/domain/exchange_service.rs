//! Exchange ledger use-cases.
//!
//! The service mints identifiers and timestamps, then hands the operation to
//! the ledger repository, which plans and applies it atomically.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ledger::{
    DecisionRequest, ExchangeProposal, LedgerRejection, ProposedOffer, RejectionKind,
};
use crate::domain::ports::{
    DecisionOutcome, ExchangeLedgerRepository, ExchangeLedgerRepositoryError, ExchangeOffer,
    Exchanges,
};
use crate::domain::{
    BookId, Error, Exchange, ExchangeDecision, ExchangeId, ExchangeSummary, UserId,
};

/// Service implementing the [`Exchanges`] driving port.
#[derive(Clone)]
pub struct ExchangeService<L> {
    ledger: Arc<L>,
    clock: Arc<dyn Clock>,
}

impl<L> ExchangeService<L> {
    pub fn new(ledger: Arc<L>, clock: Arc<dyn Clock>) -> Self {
        Self { ledger, clock }
    }
}

/// Translate a ledger rule violation into the caller-facing error.
pub fn rejection_error(rejection: LedgerRejection) -> Error {
    let message = rejection.to_string();
    match rejection.kind() {
        RejectionKind::NotFound => Error::not_found(message),
        RejectionKind::Forbidden => Error::forbidden(message),
        RejectionKind::InvalidState => Error::invalid_state(message),
    }
}

pub(crate) fn map_ledger_error(error: ExchangeLedgerRepositoryError) -> Error {
    match error {
        ExchangeLedgerRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("exchange ledger unavailable: {message}"))
        }
        ExchangeLedgerRepositoryError::Query { message } => {
            Error::internal(format!("exchange ledger error: {message}"))
        }
        ExchangeLedgerRepositoryError::Rejected { rejection } => rejection_error(rejection),
    }
}

#[async_trait]
impl<L> Exchanges for ExchangeService<L>
where
    L: ExchangeLedgerRepository,
{
    async fn request_exchange(
        &self,
        requester: &UserId,
        requested_book_id: BookId,
        offer: ExchangeOffer,
    ) -> Result<Exchange, Error> {
        let offer = match offer {
            ExchangeOffer::Existing(id) => ProposedOffer::Existing(id),
            ExchangeOffer::New(details) => ProposedOffer::New {
                book_id: BookId::random(),
                details,
            },
        };
        let proposal = ExchangeProposal {
            exchange_id: ExchangeId::random(),
            requester: requester.clone(),
            requested_book_id,
            offer,
            created_at: self.clock.utc(),
        };

        let exchange = self
            .ledger
            .request_exchange(&proposal)
            .await
            .map_err(map_ledger_error)?;
        info!(
            exchange_id = %exchange.id,
            requested_book_id = %exchange.requested_book_id,
            offered_book_id = %exchange.offered_book_id,
            "exchange requested"
        );
        Ok(exchange)
    }

    async fn update_exchange_status(
        &self,
        actor: &UserId,
        exchange_id: ExchangeId,
        decision: ExchangeDecision,
    ) -> Result<DecisionOutcome, Error> {
        let request = DecisionRequest {
            actor: actor.clone(),
            exchange_id,
            decision,
        };
        let plan = self
            .ledger
            .decide(&request)
            .await
            .map_err(map_ledger_error)?;
        info!(
            exchange_id = %exchange_id,
            status = %plan.exchange.status,
            auto_rejected = plan.auto_rejected.len(),
            "exchange decided"
        );
        Ok(DecisionOutcome {
            exchange: plan.exchange,
            auto_rejected: plan.auto_rejected,
        })
    }

    async fn list_exchanges(&self, user: &UserId) -> Result<Vec<ExchangeSummary>, Error> {
        self.ledger
            .list_for_user(user)
            .await
            .map_err(map_ledger_error)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ledger::DecisionPlan;
    use crate::domain::ports::MockExchangeLedgerRepository;
    use crate::domain::{BookDetails, ErrorCode, ExchangeStatus};
    use mockable::DefaultClock;
    use rstest::rstest;

    fn service(ledger: MockExchangeLedgerRepository) -> ExchangeService<MockExchangeLedgerRepository> {
        ExchangeService::new(Arc::new(ledger), Arc::new(DefaultClock))
    }

    fn pending_for(proposal: &ExchangeProposal, offered: BookId) -> Exchange {
        Exchange {
            id: proposal.exchange_id,
            requested_book_id: proposal.requested_book_id,
            requester_id: proposal.requester.clone(),
            offered_book_id: offered,
            status: ExchangeStatus::Pending,
            created_at: proposal.created_at,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn new_offers_get_a_fresh_book_id() {
        let requested = BookId::random();
        let mut ledger = MockExchangeLedgerRepository::new();
        ledger
            .expect_request_exchange()
            .withf(move |proposal| {
                proposal.requested_book_id == requested
                    && matches!(&proposal.offer, ProposedOffer::New { details, .. } if details.title() == "Persuasion")
            })
            .returning(|proposal| {
                let ProposedOffer::New { book_id, .. } = &proposal.offer else {
                    panic!("expected new offer");
                };
                Ok(pending_for(proposal, *book_id))
            });

        let details = BookDetails::try_new("Persuasion", "Jane Austen", None).expect("details");
        let exchange = service(ledger)
            .request_exchange(&UserId::random(), requested, ExchangeOffer::New(details))
            .await
            .expect("request succeeds");

        assert_eq!(exchange.status, ExchangeStatus::Pending);
        assert_ne!(exchange.offered_book_id, requested);
    }

    #[rstest]
    #[case(LedgerRejection::RequestedBookNotFound, ErrorCode::NotFound)]
    #[case(LedgerRejection::RequestedBookUnavailable, ErrorCode::InvalidState)]
    #[case(LedgerRejection::SelfTrade, ErrorCode::Forbidden)]
    #[case(LedgerRejection::OfferedBookNotOwned, ErrorCode::Forbidden)]
    #[case(
        LedgerRejection::ExchangeNotPending { status: ExchangeStatus::Accepted },
        ErrorCode::InvalidState
    )]
    fn rejections_map_to_error_codes(#[case] rejection: LedgerRejection, #[case] code: ErrorCode) {
        let error = map_ledger_error(ExchangeLedgerRepositoryError::rejected(rejection));
        assert_eq!(error.code(), code);
        assert_eq!(error.message(), rejection.to_string());
    }

    #[rstest]
    fn connection_failures_are_service_unavailable() {
        let error = map_ledger_error(ExchangeLedgerRepositoryError::connection("refused"));
        assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    }

    #[rstest]
    #[tokio::test]
    async fn decisions_report_cascaded_rejections() {
        let exchange_id = ExchangeId::random();
        let rival = ExchangeId::random();
        let actor = UserId::random();
        let mut ledger = MockExchangeLedgerRepository::new();
        ledger
            .expect_decide()
            .withf(move |request| {
                request.exchange_id == exchange_id && request.decision == ExchangeDecision::Accept
            })
            .returning(move |request| {
                Ok(DecisionPlan {
                    exchange: Exchange {
                        id: request.exchange_id,
                        requested_book_id: BookId::random(),
                        requester_id: UserId::random(),
                        offered_book_id: BookId::random(),
                        status: ExchangeStatus::Accepted,
                        created_at: chrono::Utc::now(),
                    },
                    book_updates: Vec::new(),
                    auto_rejected: vec![rival],
                })
            });

        let outcome = service(ledger)
            .update_exchange_status(&actor, exchange_id, ExchangeDecision::Accept)
            .await
            .expect("decision succeeds");

        assert_eq!(outcome.exchange.status, ExchangeStatus::Accepted);
        assert_eq!(outcome.auto_rejected, vec![rival]);
    }
}
