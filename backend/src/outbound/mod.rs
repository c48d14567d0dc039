//! Outbound adapters implementing the driven ports.
//!
//! - **persistence**: PostgreSQL repositories using Diesel
//! - **memory**: single-process store used without a database
//! - **credentials**: PBKDF2 credential hashing
//! - **images**: filesystem cover image storage
//! - **chat**: chat completion client for recommendations
//!
//! Adapters translate between domain types and infrastructure
//! representations. Ledger rules stay in `domain::ledger`.

pub mod chat;
pub mod credentials;
pub mod images;
pub mod memory;
pub mod persistence;
