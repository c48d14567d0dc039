//! Tests for the exchange ledger planning rules.

use super::*;
use chrono::TimeZone;
use rstest::{fixture, rstest};

struct Shelf {
    alice: UserId,
    bob: UserId,
    carol: UserId,
    now: DateTime<Utc>,
}

impl Shelf {
    fn book(&self, owner: &UserId, title: &str, status: BookStatus) -> Book {
        Book::new(
            BookId::random(),
            owner.clone(),
            BookDetails::try_new(title, "Some Author", None).expect("valid details"),
            status,
            self.now,
        )
    }

    fn proposal(&self, requester: &UserId, requested: &Book, offer: ProposedOffer) -> ExchangeProposal {
        ExchangeProposal {
            exchange_id: ExchangeId::random(),
            requester: requester.clone(),
            requested_book_id: requested.id(),
            offer,
            created_at: self.now,
        }
    }

    fn pending(&self, requester: &UserId, requested: &Book, offered: &Book) -> Exchange {
        Exchange {
            id: ExchangeId::random(),
            requested_book_id: requested.id(),
            requester_id: requester.clone(),
            offered_book_id: offered.id(),
            status: ExchangeStatus::Pending,
            created_at: self.now,
        }
    }
}

#[fixture]
fn shelf() -> Shelf {
    Shelf {
        alice: UserId::random(),
        bob: UserId::random(),
        carol: UserId::random(),
        now: Utc
            .with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp"),
    }
}

fn new_offer(title: &str) -> ProposedOffer {
    ProposedOffer::New {
        book_id: BookId::random(),
        details: BookDetails::try_new(title, "Offer Author", Some("good condition"))
            .expect("valid details"),
    }
}

fn decide(actor: &UserId, exchange: &Exchange, decision: ExchangeDecision) -> DecisionRequest {
    DecisionRequest {
        actor: actor.clone(),
        exchange_id: exchange.id,
        decision,
    }
}

#[rstest]
fn new_offer_creates_pending_book_and_leaves_requested_alone(shelf: Shelf) {
    let x = shelf.book(&shelf.alice, "X", BookStatus::Available);
    let proposal = shelf.proposal(&shelf.bob, &x, new_offer("Y"));

    let plan = plan_request(&proposal, Some(&x), None).expect("request accepted");

    let OfferedBookChange::Create(created) = &plan.offered else {
        panic!("expected a created book, got {:?}", plan.offered);
    };
    assert_eq!(created.status(), BookStatus::Pending);
    assert_eq!(created.owner_id(), &shelf.bob);
    assert_eq!(created.title(), "Y");
    assert_eq!(plan.exchange.status, ExchangeStatus::Pending);
    assert_eq!(plan.exchange.requested_book_id, x.id());
    assert_eq!(plan.exchange.offered_book_id, created.id());
    assert_eq!(plan.exchange.requester_id, shelf.bob);
}

#[rstest]
fn existing_offer_is_reserved(shelf: Shelf) {
    let x = shelf.book(&shelf.alice, "X", BookStatus::Available);
    let y = shelf.book(&shelf.bob, "Y", BookStatus::Available);
    let proposal = shelf.proposal(&shelf.bob, &x, ProposedOffer::Existing(y.id()));

    let plan = plan_request(&proposal, Some(&x), Some(&y)).expect("request accepted");

    assert_eq!(plan.offered, OfferedBookChange::Reserve(y.id()));
    assert_eq!(plan.exchange.offered_book_id, y.id());
}

#[rstest]
#[case(BookStatus::Pending)]
#[case(BookStatus::Exchanged)]
fn unavailable_requested_book_is_invalid_state(shelf: Shelf, #[case] status: BookStatus) {
    let x = shelf.book(&shelf.alice, "X", status);
    let proposal = shelf.proposal(&shelf.bob, &x, new_offer("Y"));

    let err = plan_request(&proposal, Some(&x), None).expect_err("must fail");

    assert_eq!(err, LedgerRejection::RequestedBookUnavailable);
    assert_eq!(err.kind(), RejectionKind::InvalidState);
}

#[rstest]
fn missing_requested_book_is_not_found(shelf: Shelf) {
    let x = shelf.book(&shelf.alice, "X", BookStatus::Available);
    let proposal = shelf.proposal(&shelf.bob, &x, new_offer("Y"));

    let err = plan_request(&proposal, None, None).expect_err("must fail");

    assert_eq!(err, LedgerRejection::RequestedBookNotFound);
    assert_eq!(err.kind(), RejectionKind::NotFound);
}

#[rstest]
fn requesting_own_book_is_forbidden(shelf: Shelf) {
    let x = shelf.book(&shelf.alice, "X", BookStatus::Available);
    let proposal = shelf.proposal(&shelf.alice, &x, new_offer("Y"));

    let err = plan_request(&proposal, Some(&x), None).expect_err("must fail");

    assert_eq!(err, LedgerRejection::SelfTrade);
    assert_eq!(err.kind(), RejectionKind::Forbidden);
}

#[rstest]
fn offering_someone_elses_book_is_forbidden(shelf: Shelf) {
    let x = shelf.book(&shelf.alice, "X", BookStatus::Available);
    let z = shelf.book(&shelf.carol, "Z", BookStatus::Available);
    let proposal = shelf.proposal(&shelf.bob, &x, ProposedOffer::Existing(z.id()));

    let err = plan_request(&proposal, Some(&x), Some(&z)).expect_err("must fail");

    assert_eq!(err, LedgerRejection::OfferedBookNotOwned);
}

#[rstest]
fn offering_a_reserved_book_is_invalid_state(shelf: Shelf) {
    let x = shelf.book(&shelf.alice, "X", BookStatus::Available);
    let y = shelf.book(&shelf.bob, "Y", BookStatus::Pending);
    let proposal = shelf.proposal(&shelf.bob, &x, ProposedOffer::Existing(y.id()));

    let err = plan_request(&proposal, Some(&x), Some(&y)).expect_err("must fail");

    assert_eq!(err, LedgerRejection::OfferedBookUnavailable);
}

#[rstest]
fn missing_offered_book_is_not_found(shelf: Shelf) {
    let x = shelf.book(&shelf.alice, "X", BookStatus::Available);
    let proposal = shelf.proposal(&shelf.bob, &x, ProposedOffer::Existing(BookId::random()));

    let err = plan_request(&proposal, Some(&x), None).expect_err("must fail");

    assert_eq!(err, LedgerRejection::OfferedBookNotFound);
}

#[rstest]
fn accepting_exchanges_both_books(shelf: Shelf) {
    let x = shelf.book(&shelf.alice, "X", BookStatus::Available);
    let y = shelf.book(&shelf.bob, "Y", BookStatus::Pending);
    let exchange = shelf.pending(&shelf.bob, &x, &y);

    let plan = plan_decision(
        &decide(&shelf.alice, &exchange, ExchangeDecision::Accept),
        Some(&exchange),
        Some(&shelf.alice),
        std::slice::from_ref(&exchange),
    )
    .expect("accept succeeds");

    assert_eq!(plan.exchange.status, ExchangeStatus::Accepted);
    assert_eq!(
        plan.book_updates,
        vec![
            (x.id(), BookStatus::Exchanged),
            (y.id(), BookStatus::Exchanged),
        ]
    );
    assert!(plan.auto_rejected.is_empty());
}

#[rstest]
fn accepting_rejects_competitors_without_releasing_the_traded_book(shelf: Shelf) {
    let x = shelf.book(&shelf.alice, "X", BookStatus::Available);
    let y = shelf.book(&shelf.bob, "Y", BookStatus::Pending);
    let z = shelf.book(&shelf.carol, "Z", BookStatus::Available);
    let accepted = shelf.pending(&shelf.bob, &x, &y);
    let competing = shelf.pending(&shelf.bob, &z, &y);

    let plan = plan_decision(
        &decide(&shelf.alice, &accepted, ExchangeDecision::Accept),
        Some(&accepted),
        Some(&shelf.alice),
        &[accepted.clone(), competing.clone()],
    )
    .expect("accept succeeds");

    assert_eq!(plan.auto_rejected, vec![competing.id]);
    assert!(
        !plan
            .book_updates
            .iter()
            .any(|(id, status)| *status == BookStatus::Available && *id == y.id()),
        "the exchanged book must not be released"
    );
    assert!(
        !plan.book_updates.iter().any(|(id, _)| *id == z.id()),
        "the competing exchange's requested book is left alone"
    );
}

#[rstest]
fn accepting_releases_other_offers_for_the_same_book(shelf: Shelf) {
    let x = shelf.book(&shelf.alice, "X", BookStatus::Available);
    let y = shelf.book(&shelf.bob, "Y", BookStatus::Pending);
    let w = shelf.book(&shelf.carol, "W", BookStatus::Pending);
    let accepted = shelf.pending(&shelf.bob, &x, &y);
    let rival = shelf.pending(&shelf.carol, &x, &w);

    let plan = plan_decision(
        &decide(&shelf.alice, &accepted, ExchangeDecision::Accept),
        Some(&accepted),
        Some(&shelf.alice),
        &[rival.clone(), accepted.clone()],
    )
    .expect("accept succeeds");

    assert_eq!(plan.auto_rejected, vec![rival.id]);
    assert!(plan.book_updates.contains(&(w.id(), BookStatus::Available)));
}

#[rstest]
fn accepting_never_releases_the_requested_book_when_it_backs_another_offer(shelf: Shelf) {
    // Alice later staked X against Carol's V; accepting Bob's offer for X
    // rejects that proposal but must keep X exchanged.
    let x = shelf.book(&shelf.alice, "X", BookStatus::Pending);
    let y = shelf.book(&shelf.bob, "Y", BookStatus::Pending);
    let v = shelf.book(&shelf.carol, "V", BookStatus::Available);
    let accepted = shelf.pending(&shelf.bob, &x, &y);
    let staked = shelf.pending(&shelf.alice, &v, &x);

    let plan = plan_decision(
        &decide(&shelf.alice, &accepted, ExchangeDecision::Accept),
        Some(&accepted),
        Some(&shelf.alice),
        &[staked.clone()],
    )
    .expect("accept succeeds");

    assert_eq!(plan.auto_rejected, vec![staked.id]);
    assert!(!plan.book_updates.contains(&(x.id(), BookStatus::Available)));
}

#[rstest]
fn candidates_that_are_terminal_or_unrelated_are_ignored(shelf: Shelf) {
    let x = shelf.book(&shelf.alice, "X", BookStatus::Available);
    let y = shelf.book(&shelf.bob, "Y", BookStatus::Pending);
    let u = shelf.book(&shelf.carol, "U", BookStatus::Available);
    let t = shelf.book(&shelf.bob, "T", BookStatus::Pending);
    let accepted = shelf.pending(&shelf.bob, &x, &y);
    let mut settled = shelf.pending(&shelf.carol, &x, &u);
    settled.status = ExchangeStatus::Rejected;
    let unrelated = shelf.pending(&shelf.bob, &u, &t);

    let plan = plan_decision(
        &decide(&shelf.alice, &accepted, ExchangeDecision::Accept),
        Some(&accepted),
        Some(&shelf.alice),
        &[settled, unrelated],
    )
    .expect("accept succeeds");

    assert!(plan.auto_rejected.is_empty());
    assert_eq!(plan.book_updates.len(), 2);
}

#[rstest]
fn rejecting_releases_only_the_offered_book(shelf: Shelf) {
    let x = shelf.book(&shelf.alice, "X", BookStatus::Available);
    let y = shelf.book(&shelf.bob, "Y", BookStatus::Pending);
    let exchange = shelf.pending(&shelf.bob, &x, &y);

    let plan = plan_decision(
        &decide(&shelf.alice, &exchange, ExchangeDecision::Reject),
        Some(&exchange),
        Some(&shelf.alice),
        &[],
    )
    .expect("reject succeeds");

    assert_eq!(plan.exchange.status, ExchangeStatus::Rejected);
    assert_eq!(plan.book_updates, vec![(y.id(), BookStatus::Available)]);
    assert!(plan.auto_rejected.is_empty());
}

#[rstest]
fn deciding_a_missing_exchange_is_not_found(shelf: Shelf) {
    let request = DecisionRequest {
        actor: shelf.alice.clone(),
        exchange_id: ExchangeId::random(),
        decision: ExchangeDecision::Accept,
    };

    let err = plan_decision(&request, None, None, &[]).expect_err("must fail");

    assert_eq!(err, LedgerRejection::ExchangeNotFound);
}

#[rstest]
#[case::requester(true)]
#[case::stranger(false)]
fn only_the_requested_book_owner_may_decide(shelf: Shelf, #[case] as_requester: bool) {
    let x = shelf.book(&shelf.alice, "X", BookStatus::Available);
    let y = shelf.book(&shelf.bob, "Y", BookStatus::Pending);
    let exchange = shelf.pending(&shelf.bob, &x, &y);
    let actor = if as_requester { &shelf.bob } else { &shelf.carol };

    let err = plan_decision(
        &decide(actor, &exchange, ExchangeDecision::Accept),
        Some(&exchange),
        Some(&shelf.alice),
        &[],
    )
    .expect_err("must fail");

    assert_eq!(err, LedgerRejection::NotRequestedBookOwner);
    assert_eq!(err.kind(), RejectionKind::Forbidden);
}

#[rstest]
#[case(ExchangeStatus::Accepted, ExchangeDecision::Reject)]
#[case(ExchangeStatus::Rejected, ExchangeDecision::Accept)]
#[case(ExchangeStatus::Rejected, ExchangeDecision::Reject)]
fn terminal_exchanges_cannot_be_redecided(
    shelf: Shelf,
    #[case] status: ExchangeStatus,
    #[case] decision: ExchangeDecision,
) {
    let x = shelf.book(&shelf.alice, "X", BookStatus::Available);
    let y = shelf.book(&shelf.bob, "Y", BookStatus::Available);
    let mut exchange = shelf.pending(&shelf.bob, &x, &y);
    exchange.status = status;

    let err = plan_decision(
        &decide(&shelf.alice, &exchange, decision),
        Some(&exchange),
        Some(&shelf.alice),
        &[],
    )
    .expect_err("must fail");

    assert_eq!(err, LedgerRejection::ExchangeNotPending { status });
    assert_eq!(err.kind(), RejectionKind::InvalidState);
}

#[rstest]
fn ownership_is_checked_before_status(shelf: Shelf) {
    let x = shelf.book(&shelf.alice, "X", BookStatus::Available);
    let y = shelf.book(&shelf.bob, "Y", BookStatus::Available);
    let mut exchange = shelf.pending(&shelf.bob, &x, &y);
    exchange.status = ExchangeStatus::Accepted;

    let err = plan_decision(
        &decide(&shelf.carol, &exchange, ExchangeDecision::Reject),
        Some(&exchange),
        Some(&shelf.alice),
        &[],
    )
    .expect_err("must fail");

    assert_eq!(err, LedgerRejection::NotRequestedBookOwner);
}
