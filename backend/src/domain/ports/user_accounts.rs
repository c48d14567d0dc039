//! Driving port for account registration and profile management.

use async_trait::async_trait;

use crate::domain::{Error, ProfileUpdate, Registration, User, UserId};

/// Use-cases over a member's own account.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserAccounts: Send + Sync {
    /// Create an account. Fails with `conflict` when the username or email
    /// is already taken.
    async fn register(&self, registration: &Registration) -> Result<User, Error>;

    /// Load the caller's profile.
    async fn profile(&self, user_id: &UserId) -> Result<User, Error>;

    /// Apply a partial profile change and return the updated profile.
    async fn update_profile(&self, user_id: &UserId, update: &ProfileUpdate)
    -> Result<User, Error>;
}
