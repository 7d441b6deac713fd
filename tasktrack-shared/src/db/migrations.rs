//! Schema migrations
//!
//! Migrations live in the workspace-level `migrations/` directory as
//! reversible pairs (`{version}_{name}.up.sql` / `.down.sql`) and are embedded
//! into the binary at compile time.
//!
//! # Example
//!
//! ```no_run
//! use tasktrack_shared::db::migrations::{ensure_database_exists, run_migrations};
//! use tasktrack_shared::db::pool::{create_pool, DatabaseConfig};
//!
//! # async fn example(url: String) -> Result<(), Box<dyn std::error::Error>> {
//! ensure_database_exists(&url).await?;
//! let pool = create_pool(DatabaseConfig { url, ..Default::default() }).await?;
//! run_migrations(&pool).await?;
//! # Ok(())
//! # }
//! ```

use sqlx::migrate::{MigrateDatabase, MigrateError, Migrator};
use sqlx::postgres::PgPool;
use sqlx::Postgres;
use tracing::{debug, error, info};

/// Embedded migrations
pub static MIGRATOR: Migrator = sqlx::migrate!("../migrations");

/// Applies every pending migration
///
/// Already-applied migrations are skipped, so this is safe to run on every
/// startup.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    let available = MIGRATOR
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .count();
    info!(available, "Running database migrations");

    MIGRATOR.run(pool).await.map_err(|e| {
        error!(error = %e, "Migration failed");
        e
    })?;

    info!("Database schema is up to date");
    Ok(())
}

/// Creates the database named in `database_url` if it is missing
///
/// Intended for development and test setups.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if Postgres::database_exists(database_url).await? {
        debug!("Database already exists");
        return Ok(());
    }

    info!("Database does not exist, creating it");
    Postgres::create_database(database_url).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_embedded_in_order() {
        let versions: Vec<i64> = MIGRATOR
            .iter()
            .filter(|m| !m.migration_type.is_down_migration())
            .map(|m| m.version)
            .collect();
        assert_eq!(versions.len(), 3);
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_migrations_are_reversible() {
        assert!(MIGRATOR.iter().all(|m| m.migration_type.is_reversible()));
    }
}
