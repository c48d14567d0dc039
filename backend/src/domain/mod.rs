//! Domain primitives, aggregates and services.
//!
//! Purpose: define the marketplace entities (users, books, exchanges), the
//! exchange ledger state machine and the services behind the driving ports.
//! Nothing here knows about HTTP or SQL.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - User, Username, EmailAddress: identity store values.
//! - Book, BookStatus, BookDetails, CatalogEntry: catalog values.
//! - Exchange, ExchangeStatus, ExchangeDecision: ledger values.
//! - ledger: pure planning functions for the exchange state machine.
//! - *Service: implementations of the driving ports in [`ports`].

pub mod auth;
pub mod book;
pub mod catalog_service;
pub mod error;
pub mod exchange;
pub mod exchange_service;
pub mod identity_service;
pub mod ledger;
pub mod ports;
pub mod recommendation;
pub mod trace_id;
pub mod user;

pub use self::auth::{
    LoginCredentials, LoginValidationError, Password, PasswordHash, ProfileUpdate, Registration,
};
pub use self::book::{
    Book, BookDetails, BookId, BookStatus, BookValidationError, CatalogEntry, ImageRef,
    UnknownBookStatus,
};
pub use self::catalog_service::CatalogService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::exchange::{
    Exchange, ExchangeDecision, ExchangeId, ExchangeStatus, ExchangeSummary, InvalidDecision,
    UnknownExchangeStatus,
};
pub use self::exchange_service::ExchangeService;
pub use self::identity_service::IdentityService;
pub use self::ledger::{
    DecisionPlan, DecisionRequest, ExchangeProposal, LedgerRejection, OfferedBookChange,
    ProposedOffer, RequestPlan,
};
pub use self::recommendation::RecommendationService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{EmailAddress, User, UserId, UserValidationError, Username};
