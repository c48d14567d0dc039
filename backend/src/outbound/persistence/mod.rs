//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repositories translate between Diesel rows (`models.rs`, `schema.rs`) and
//! domain types; row types never leave this module. Connections come from a
//! `bb8` pool over `diesel-async`.
//!
//! ```ignore
//! use bookswap::outbound::persistence::{DbPool, DieselBookRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/bookswap")).await?;
//! let books = DieselBookRepository::new(pool);
//! ```

mod diesel_book_repository;
mod diesel_error_mapping;
mod diesel_exchange_ledger_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_book_repository::DieselBookRepository;
pub use diesel_exchange_ledger_repository::DieselExchangeLedgerRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::run_pending_migrations;
pub use pool::{DbPool, PoolConfig, PoolError};
