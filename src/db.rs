use anyhow::{Context, Result};
use diesel::{Connection, PgConnection};
use diesel_async::{
    AsyncPgConnection,
    pooled_connection::{AsyncDieselConnectionManager, bb8::Pool},
};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::{aliases::DbPool, config::DatabaseConfig};

/// Migrations embedded into the binary which helps with streamlining image building process
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Builds the async connection pool and checks that a connection can be established.
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.url);
    Pool::builder()
        .max_size(config.max_connections)
        .build(manager)
        .await
        .context("Failed to build the DB connection pool")
}

/// Applies pending migrations over a synchronous connection on a blocking thread.
///
/// Returns the number of migrations that were applied.
pub async fn run_migrations_blocking(database_url: &str) -> Result<usize> {
    let database_url = database_url.to_owned();

    tokio::task::spawn_blocking(move || -> Result<usize> {
        let mut conn = PgConnection::establish(&database_url)
            .context("Failed to connect to the database for migrations")?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| anyhow::anyhow!("Failed to run migrations: {err}"))?;
        Ok(applied.len())
    })
    .await
    .context("Migration task panicked")?
}
