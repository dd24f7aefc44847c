//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! bandsite-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `BANDSITE_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! Schema migrations live in `crates/server/migrations/`. The session table
//! belongs to `tower-sessions-sqlx-store` and is created by its own migration.

use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

use super::{ConnectError, connect};

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Session store migration error: {0}")]
    SessionStore(#[from] sqlx::Error),
}

/// Run schema migrations, then the session store migration.
pub async fn run() -> Result<(), MigrationError> {
    let pool = connect().await?;

    tracing::info!("Running schema migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Running session store migration...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
