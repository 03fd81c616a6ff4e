//! CLI command implementations.

pub mod migrate;
pub mod restock;
pub mod seed;
pub mod staff;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by the CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{0}")]
    Other(String),
}

/// Connect to the storefront database from `WINNIECHO_DATABASE_URL`.
pub(crate) async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("WINNIECHO_DATABASE_URL")
        .map_err(|_| CommandError::MissingEnvVar("WINNIECHO_DATABASE_URL"))?;
    let database_url = SecretString::from(database_url);

    let pool = winniecho_storefront::db::create_pool(&database_url).await?;
    Ok(pool)
}
