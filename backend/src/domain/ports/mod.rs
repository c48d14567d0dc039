//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, hasher, image store, text generator) describe
//! what the domain needs from infrastructure. Driving ports (login, accounts,
//! catalog, exchanges, recommendations) are what inbound adapters call.

mod macros;
pub(crate) use macros::define_port_error;

mod book_repository;
mod catalog;
mod credential_hasher;
mod exchange_ledger_repository;
mod exchanges;
mod image_store;
mod login_service;
mod recommendations;
mod text_generator;
mod user_accounts;
mod user_repository;

#[cfg(test)]
pub use book_repository::MockBookRepository;
pub use book_repository::{BookRepository, BookRepositoryError};
#[cfg(test)]
pub use catalog::MockCatalog;
pub use catalog::{Catalog, NewListing};
#[cfg(test)]
pub use credential_hasher::MockCredentialHasher;
pub use credential_hasher::{CredentialHasher, CredentialHasherError};
#[cfg(test)]
pub use exchange_ledger_repository::MockExchangeLedgerRepository;
pub use exchange_ledger_repository::{ExchangeLedgerRepository, ExchangeLedgerRepositoryError};
#[cfg(test)]
pub use exchanges::MockExchanges;
pub use exchanges::{DecisionOutcome, ExchangeOffer, Exchanges};
#[cfg(test)]
pub use image_store::MockImageStore;
pub use image_store::{CoverUpload, DisabledImageStore, ImageStore, ImageStoreError};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::LoginService;
#[cfg(test)]
pub use recommendations::MockRecommendations;
pub use recommendations::{Recommendation, RecommendationRequest, Recommendations};
#[cfg(test)]
pub use text_generator::MockTextGenerator;
pub use text_generator::{
    ChatPrompt, ChatRole, ChatTurn, TextGenerationError, TextGenerator, UnconfiguredTextGenerator,
};
#[cfg(test)]
pub use user_accounts::MockUserAccounts;
pub use user_accounts::UserAccounts;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRecord, UserRepository};
