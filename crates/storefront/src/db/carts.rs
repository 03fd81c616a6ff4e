//! Cart repository.
//!
//! One cart per user, created at registration. Mutations are
//! last-write-wins (single-user data); the unique (cart, product) pair is
//! enforced by the schema and the add operation is an upsert.

use sqlx::{PgExecutor, PgPool};

use winniecho_core::{CartItemId, ProductId, UserId};

use super::RepositoryError;
use crate::models::cart::CartLine;

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch cart lines joined with current product name, price, and stock,
    /// in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines_for_user(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLine>(
            "SELECT ci.id, ci.cart_id, ci.product_id,
                    p.name AS product_name, p.price AS unit_price, p.stock,
                    ci.quantity
             FROM cart_items ci
             JOIN carts c ON c.id = ci.cart_id
             JOIN products p ON p.id = ci.product_id
             WHERE c.user_id = $1
             ORDER BY ci.id",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(lines)
    }

    /// Fetch a single cart line, with current stock, only if it belongs to
    /// the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_line(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let line = sqlx::query_as::<_, CartLine>(
            "SELECT ci.id, ci.cart_id, ci.product_id,
                    p.name AS product_name, p.price AS unit_price, p.stock,
                    ci.quantity
             FROM cart_items ci
             JOIN carts c ON c.id = ci.cart_id
             JOIN products p ON p.id = ci.product_id
             WHERE ci.id = $2 AND c.user_id = $1",
        )
        .bind(user_id)
        .bind(item_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(line)
    }

    /// Add a product to the cart, incrementing quantity if the line exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO cart_items (cart_id, product_id, quantity)
             SELECT c.id, $2, $3 FROM carts c WHERE c.user_id = $1
             ON CONFLICT (cart_id, product_id)
             DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Set a cart line's quantity; ownership is enforced in the predicate.
    /// Returns `false` if the line does not belong to the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE cart_items ci SET quantity = $3
             FROM carts c
             WHERE ci.id = $2 AND ci.cart_id = c.id AND c.user_id = $1",
        )
        .bind(user_id)
        .bind(item_id)
        .bind(quantity)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Remove a cart line. Returns `false` if it does not belong to the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn remove_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM cart_items ci
             USING carts c
             WHERE ci.id = $2 AND ci.cart_id = c.id AND c.user_id = $1",
        )
        .bind(user_id)
        .bind(item_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

/// Clear a user's cart through any executor (payment finalization runs this
/// best-effort from the webhook path).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the delete fails.
pub async fn clear_for_user(
    executor: impl PgExecutor<'_>,
    user_id: UserId,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "DELETE FROM cart_items ci
         USING carts c
         WHERE ci.cart_id = c.id AND c.user_id = $1",
    )
    .bind(user_id)
    .execute(executor)
    .await?;

    Ok(())
}
