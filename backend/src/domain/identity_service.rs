//! Identity store use-cases: registration, login and profile management.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::domain::ports::{
    CredentialHasher, CredentialHasherError, LoginService, UserAccounts, UserPersistenceError,
    UserRecord, UserRepository,
};
use crate::domain::{Error, LoginCredentials, ProfileUpdate, Registration, User, UserId};

/// Service implementing [`LoginService`] and [`UserAccounts`] over a user
/// repository and a credential hasher.
#[derive(Clone)]
pub struct IdentityService<R, H> {
    users: Arc<R>,
    hasher: Arc<H>,
    clock: Arc<dyn Clock>,
}

impl<R, H> IdentityService<R, H> {
    pub fn new(users: Arc<R>, hasher: Arc<H>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            hasher,
            clock,
        }
    }
}

pub(crate) fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::DuplicateUsername { .. } => {
            Error::conflict("username already exists")
        }
        UserPersistenceError::DuplicateEmail { .. } => Error::conflict("email already taken"),
    }
}

fn map_hasher_error(error: CredentialHasherError) -> Error {
    Error::internal(format!("credential hashing failed: {error}"))
}

impl<R, H> IdentityService<R, H>
where
    R: UserRepository,
    H: CredentialHasher + 'static,
{
    /// Run a hashing job on the blocking pool so key stretching never stalls
    /// an executor thread.
    async fn with_hasher<T, F>(&self, job: F) -> Result<T, Error>
    where
        F: FnOnce(&H) -> Result<T, CredentialHasherError> + Send + 'static,
        T: Send + 'static,
    {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || job(hasher.as_ref()))
            .await
            .map_err(|err| Error::internal(format!("credential hashing task failed: {err}")))?
            .map_err(map_hasher_error)
    }

    async fn load(&self, user_id: &UserId) -> Result<UserRecord, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("user not found"))
    }
}

#[async_trait]
impl<R, H> LoginService for IdentityService<R, H>
where
    R: UserRepository,
    H: CredentialHasher + 'static,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        let record = self
            .users
            .find_by_username(credentials.username())
            .await
            .map_err(map_user_error)?;

        // Unknown usernames still pay for a full verification.
        let password = Zeroizing::new(credentials.password().to_owned());
        let stored = record.as_ref().map(|record| record.password_hash.clone());
        let verified = self
            .with_hasher(move |hasher| {
                let hash = stored.unwrap_or_else(|| hasher.decoy_hash());
                hasher.verify(&password, &hash)
            })
            .await?;

        match record {
            Some(record) if verified => Ok(record.user.id().clone()),
            Some(record) => {
                debug!(user_id = %record.user.id(), "login with wrong password");
                Err(Error::unauthorized("invalid credentials"))
            }
            None => {
                debug!(username = credentials.username(), "login for unknown user");
                Err(Error::unauthorized("invalid credentials"))
            }
        }
    }
}

#[async_trait]
impl<R, H> UserAccounts for IdentityService<R, H>
where
    R: UserRepository,
    H: CredentialHasher + 'static,
{
    async fn register(&self, registration: &Registration) -> Result<User, Error> {
        let existing = self
            .users
            .find_by_username(registration.username().as_ref())
            .await
            .map_err(map_user_error)?;
        if existing.is_some() {
            return Err(Error::conflict("username already exists"));
        }

        let password = registration.password().clone();
        let password_hash = self
            .with_hasher(move |hasher| hasher.hash(&password))
            .await?;
        let user = User::new(
            UserId::random(),
            registration.username().clone(),
            registration.email().cloned(),
            registration.location().map(str::to_owned),
            self.clock.utc(),
        );
        let record = UserRecord {
            user,
            password_hash,
        };
        self.users.create(&record).await.map_err(map_user_error)?;

        info!(user_id = %record.user.id(), "registered user");
        Ok(record.user)
    }

    async fn profile(&self, user_id: &UserId) -> Result<User, Error> {
        Ok(self.load(user_id).await?.user)
    }

    async fn update_profile(
        &self,
        user_id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<User, Error> {
        let current = self.load(user_id).await?.user;

        let email = match update.email() {
            Some(email) => email.cloned(),
            None => current.email().cloned(),
        };
        let location = match update.location() {
            Some(location) => location.map(str::to_owned),
            None => current.location().map(str::to_owned),
        };
        let password_hash = match update.password().cloned() {
            Some(password) => Some(
                self.with_hasher(move |hasher| hasher.hash(&password))
                    .await?,
            ),
            None => None,
        };

        let updated = current.with_contact(email, location);
        self.users
            .update(&updated, password_hash)
            .await
            .map_err(map_user_error)?;
        Ok(updated)
    }
}
