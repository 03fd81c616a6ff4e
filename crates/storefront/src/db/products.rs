//! Catalog repository.
//!
//! Stock mutation is the one hot shared counter in the system, so both
//! `decrement_stock` and `restock` are single conditional UPDATE statements
//! (compare-and-decrement), never read-then-write. Both derive
//! `ProductStatus` from the resulting stock; operators may still set status
//! manually elsewhere, so the derived invariant is best-effort by design.

use sqlx::{PgExecutor, PgPool};

use winniecho_core::{ProductId, ProductStatus};

use super::RepositoryError;
use crate::models::product::{Category, Product};

/// Sort orders for product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    #[default]
    Name,
    PriceLowToHigh,
    PriceHighToLow,
    Newest,
}

impl ProductSort {
    const fn order_clause(self) -> &'static str {
        match self {
            Self::Name => "name ASC",
            Self::PriceLowToHigh => "price ASC",
            Self::PriceHighToLow => "price DESC",
            Self::Newest => "created_at DESC",
        }
    }
}

/// Filters for product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Single-letter category code (D/M/W/A).
    pub category_code: Option<String>,
    /// Case-insensitive substring match on name or description.
    pub search: Option<String>,
    pub sort: ProductSort,
}

/// Repository for catalog database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active products matching the filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "SELECT p.id, p.category_id, p.name, p.description, p.price, p.stock, p.status, p.created_at
             FROM products p
             JOIN categories c ON c.id = p.category_id
             WHERE p.status = 'active'
               AND ($1::text IS NULL OR c.code = $1)
               AND ($2::text IS NULL OR p.name ILIKE '%' || $2 || '%'
                    OR p.description ILIKE '%' || $2 || '%')
             ORDER BY p.{}",
            filter.sort.order_clause()
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(filter.category_code.as_deref())
            .bind(filter.search.as_deref())
            .fetch_all(self.pool)
            .await?;

        Ok(products)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, category_id, name, description, price, stock, status, created_at
             FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// List all categories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, code, name, description FROM categories ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// Restock a product, reactivating it if it was out of stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn restock(&self, id: ProductId, quantity: i32) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE products
             SET stock = stock + $2,
                 status = CASE WHEN status = $3 AND stock + $2 > 0 THEN $4 ELSE status END
             WHERE id = $1",
        )
        .bind(id)
        .bind(quantity)
        .bind(ProductStatus::OutOfStock)
        .bind(ProductStatus::Active)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}

/// Atomically decrement stock, deriving `OutOfStock` when it hits zero.
///
/// The `stock >= quantity` predicate makes the check and the decrement one
/// statement, so two overlapping checkouts cannot both pass a stale check.
/// Returns `false` when stock was insufficient (no row mutated).
///
/// Takes an executor so checkout can run it inside its transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn decrement_stock(
    executor: impl PgExecutor<'_>,
    id: ProductId,
    quantity: i32,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        "UPDATE products
         SET stock = stock - $2,
             status = CASE WHEN stock - $2 = 0 THEN $3 ELSE status END
         WHERE id = $1 AND stock >= $2",
    )
    .bind(id)
    .bind(quantity)
    .bind(ProductStatus::OutOfStock)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}
