//! Driven port for one-way credential hashing.

use crate::domain::{Password, PasswordHash};

use super::define_port_error;

define_port_error! {
    /// Errors raised by credential hashing adapters.
    pub enum CredentialHasherError {
        /// The stored hash could not be decoded.
        MalformedHash { message: String } => "stored credential hash is malformed: {message}",
        /// Hashing itself failed.
        Hashing { message: String } => "credential hashing failed: {message}",
    }
}

/// Hash and verify user secrets. Implementations are CPU-bound and
/// synchronous; async callers run them via `spawn_blocking`.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialHasher: Send + Sync {
    /// Produce a salted, self-describing hash of `password`.
    fn hash(&self, password: &Password) -> Result<PasswordHash, CredentialHasherError>;

    /// Check `password` against a hash produced by [`CredentialHasher::hash`].
    fn verify(&self, password: &str, hash: &PasswordHash) -> Result<bool, CredentialHasherError>;

    /// A well-formed hash no password matches, costing as much to verify as
    /// a real one. Checked on unknown-user logins to keep timing uniform.
    fn decoy_hash(&self) -> PasswordHash;
}
