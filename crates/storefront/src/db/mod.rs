//! Database operations for the storefront `PostgreSQL`.
//!
//! ## Tables
//!
//! - `users` / `members` - Accounts and loyalty profiles
//! - `addresses` - Delivery addresses (one default per user)
//! - `categories` / `products` - Catalog
//! - `carts` / `cart_items` - Per-user carts
//! - `orders` / `order_items` - Immutable order snapshots
//! - `payments` - Payment attempts (one Success per order, guarded)
//! - `delivery_proofs` - Proof-of-delivery, one per order
//! - `sessions` - tower-sessions storage
//!
//! All repositories use runtime `sqlx::query` / `query_as` with `FromRow`
//! models. Every race-sensitive write is a single conditional UPDATE so the
//! check and the mutation are one atomic statement (stock
//! compare-and-decrement, payment success claim, loyalty balance guard,
//! order status transition guard).
//!
//! # Migrations
//!
//! Migrations live in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p winniecho-cli -- migrate
//! ```

pub mod addresses;
pub mod carts;
pub mod delivery_proofs;
pub mod members;
pub mod orders;
pub mod password_resets;
pub mod payments;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors produced by the repository layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unique constraint violation surfaced as a domain conflict.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored value failed domain validation on load.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
