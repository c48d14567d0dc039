//! Port abstraction for the identity store and its errors.
use async_trait::async_trait;

use crate::domain::{PasswordHash, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another user already holds the username.
        DuplicateUsername { username: String } => "username already exists: {username}",
        /// Another user already holds the email address.
        DuplicateEmail { email: String } => "email already taken: {email}",
    }
}

/// Stored identity together with its credential hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: PasswordHash,
}

/// Identity store port.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Uniqueness of username and email is enforced here.
    async fn create(&self, record: &UserRecord) -> Result<(), UserPersistenceError>;

    /// Fetch a user by login name.
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, UserPersistenceError>;

    /// Persist contact details and, when given, a replacement credential hash.
    async fn update(
        &self,
        user: &User,
        password_hash: Option<PasswordHash>,
    ) -> Result<(), UserPersistenceError>;
}
