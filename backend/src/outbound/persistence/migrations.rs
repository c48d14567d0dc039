//! Embedded schema migrations.

use diesel::{Connection, PgConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use super::pool::PoolError;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Apply pending migrations over a short-lived blocking connection.
///
/// # Errors
///
/// Returns [`PoolError::Build`] when the database cannot be reached or a
/// migration fails.
pub async fn run_pending_migrations(database_url: &str) -> Result<(), PoolError> {
    let url = database_url.to_owned();
    let applied = tokio::task::spawn_blocking(move || -> Result<usize, PoolError> {
        let mut conn = PgConnection::establish(&url)
            .map_err(|err| PoolError::build(format!("connect for migrations: {err}")))?;
        let versions = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| PoolError::build(format!("migration failed: {err}")))?;
        Ok(versions.len())
    })
    .await
    .map_err(|err| PoolError::build(format!("migration task failed: {err}")))??;

    info!(applied, "database migrations complete");
    Ok(())
}
