//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Uniqueness of usernames and emails is left to the database constraints;
//! violations are translated by constraint name.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{UserPersistenceError, UserRecord, UserRepository};
use crate::domain::{EmailAddress, PasswordHash, User, UserId, Username};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewUserRow, UserContactUpdate, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the identity store.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> UserPersistenceError {
    map_pool_error(error, UserPersistenceError::connection)
}

/// Map Diesel errors, recognising unique violations on username and email.
fn diesel_error(error: DieselError, user: Option<&User>) -> UserPersistenceError {
    if let (DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info), Some(user)) =
        (&error, user)
    {
        let names_email = info
            .constraint_name()
            .unwrap_or_else(|| info.message())
            .contains("email");
        return match (names_email, user.email()) {
            (true, Some(email)) => UserPersistenceError::duplicate_email(email.as_ref()),
            _ => UserPersistenceError::duplicate_username(user.username().as_ref()),
        };
    }
    map_diesel_error(
        error,
        UserPersistenceError::query,
        UserPersistenceError::connection,
    )
}

fn row_to_record(row: UserRow) -> Result<UserRecord, UserPersistenceError> {
    let username = Username::new(&row.username).map_err(|err| {
        UserPersistenceError::query(format!("invalid username stored for {}: {err}", row.id))
    })?;
    let email = match row.email.as_deref().map(EmailAddress::new).transpose() {
        Ok(email) => email,
        Err(err) => {
            warn!(user_id = %row.id, %err, "ignoring unparseable stored email");
            None
        }
    };
    let user = User::new(
        UserId::from_uuid(row.id),
        username,
        email,
        row.location,
        row.created_at,
    );
    Ok(UserRecord {
        user,
        password_hash: PasswordHash::new(row.password_hash),
    })
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, record: &UserRecord) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let user = &record.user;
        let row = NewUserRow {
            id: *user.id().as_uuid(),
            username: user.username().as_ref(),
            password_hash: record.password_hash.as_ref(),
            email: user.email().map(AsRef::as_ref),
            location: user.location(),
            created_at: user.created_at(),
        };

        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(|err| diesel_error(err, Some(user)))?;
        Ok(())
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::username.eq(username))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| diesel_error(err, None))?;
        row.map(row_to_record).transpose()
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<UserRow> = users::table
            .find(*id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| diesel_error(err, None))?;
        row.map(row_to_record).transpose()
    }

    async fn update(
        &self,
        user: &User,
        password_hash: Option<PasswordHash>,
    ) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let contact = UserContactUpdate {
            email: user.email().map(AsRef::as_ref),
            location: user.location(),
        };
        let target = users::table.find(*user.id().as_uuid());

        let updated = match password_hash {
            Some(hash) => {
                diesel::update(target)
                    .set((&contact, users::password_hash.eq(hash.as_ref())))
                    .execute(&mut conn)
                    .await
            }
            None => diesel::update(target).set(&contact).execute(&mut conn).await,
        }
        .map_err(|err| diesel_error(err, Some(user)))?;

        if updated == 0 {
            return Err(UserPersistenceError::query(format!(
                "user {} not found",
                user.id()
            )));
        }
        Ok(())
    }
}
