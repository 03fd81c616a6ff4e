//! Database migration command.
//!
//! Migrations live in `crates/storefront/migrations/` and are embedded in
//! the binary at compile time.

use super::{CommandError, connect};

/// Run the storefront database migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    tracing::info!("Connecting to storefront database...");
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
