//! CLI subcommands.

pub mod admin;
pub mod migrate;
pub mod tenant;

use secrecy::SecretString;

/// Database connection errors shared by every command.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("Missing environment variable: BANDSITE_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect using `BANDSITE_DATABASE_URL`, falling back to `DATABASE_URL`.
pub async fn connect() -> Result<sqlx::PgPool, ConnectError> {
    dotenvy::dotenv().ok();

    let url = std::env::var("BANDSITE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| ConnectError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to database...");
    Ok(bandsite_server::db::create_pool(&SecretString::from(url)).await?)
}
