//! Order repository.
//!
//! Orders are append-only: rows are created at checkout and never deleted;
//! only `status` and `loyalty_points_earned` ever change, and status moves
//! through a conditional UPDATE so concurrent transitions cannot skip or
//! repeat states.

use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};

use winniecho_core::{AddressId, OrderId, OrderNumber, OrderStatus, ProductId, UserId};

use super::RepositoryError;
use crate::models::order::{Order, OrderItem};

const SELECT: &str = "SELECT id, order_number, address_id, subtotal, status,
                      loyalty_points_used, loyalty_points_earned, created_at FROM orders";

/// The user an order belongs to (via its snapshotted address).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderOwner {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!("{SELECT} WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(order)
    }

    /// Get an order only if it belongs to the given user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            "SELECT o.id, o.order_number, o.address_id, o.subtotal, o.status,
                    o.loyalty_points_used, o.loyalty_points_earned, o.created_at
             FROM orders o
             JOIN addresses a ON a.id = o.address_id
             WHERE o.id = $1 AND a.user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// List a user's order history, newest first, cancelled orders excluded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT o.id, o.order_number, o.address_id, o.subtotal, o.status,
                    o.loyalty_points_used, o.loyalty_points_earned, o.created_at
             FROM orders o
             JOIN addresses a ON a.id = o.address_id
             WHERE a.user_id = $1 AND o.status <> $2
             ORDER BY o.created_at DESC",
        )
        .bind(user_id)
        .bind(OrderStatus::Cancelled)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// List orders currently in the fulfillment pipeline (confirmed or
    /// shipped), oldest first so drivers work the backlog in order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_fulfillment(&self) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "{SELECT} WHERE status = ANY($1) ORDER BY created_at"
        ))
        .bind(vec![OrderStatus::Confirmed, OrderStatus::Shipped])
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Fetch the snapshotted items of an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT id, order_id, product_id, product_name, unit_price, quantity, subtotal
             FROM order_items WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Resolve the owning user of an order through its address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn owner(&self, order_id: OrderId) -> Result<Option<OrderOwner>, RepositoryError> {
        let owner = sqlx::query_as::<_, OrderOwner>(
            "SELECT u.id AS user_id, u.email, u.name
             FROM orders o
             JOIN addresses a ON a.id = o.address_id
             JOIN users u ON u.id = a.user_id
             WHERE o.id = $1",
        )
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(owner)
    }
}

/// Insert a new pending order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn create(
    executor: impl PgExecutor<'_>,
    address_id: AddressId,
    subtotal: Decimal,
    points_used: Decimal,
) -> Result<Order, RepositoryError> {
    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (order_number, address_id, subtotal, status, loyalty_points_used)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, order_number, address_id, subtotal, status,
                   loyalty_points_used, loyalty_points_earned, created_at",
    )
    .bind(OrderNumber::generate().as_str())
    .bind(address_id)
    .bind(subtotal)
    .bind(OrderStatus::Pending)
    .bind(points_used)
    .fetch_one(executor)
    .await?;

    Ok(order)
}

/// Insert an order item snapshot.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_item(
    executor: impl PgExecutor<'_>,
    order_id: OrderId,
    product_id: ProductId,
    product_name: &str,
    unit_price: Decimal,
    quantity: i32,
    subtotal: Decimal,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO order_items (order_id, product_id, product_name, unit_price, quantity, subtotal)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(product_name)
    .bind(unit_price)
    .bind(quantity)
    .bind(subtotal)
    .execute(executor)
    .await?;

    Ok(())
}

/// Conditionally transition an order's status. Returns `false` when the
/// order was not in the expected `from` state (someone else transitioned
/// it first, or the transition is stale).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn transition_status(
    executor: impl PgExecutor<'_>,
    order_id: OrderId,
    from: OrderStatus,
    to: OrderStatus,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query("UPDATE orders SET status = $3 WHERE id = $1 AND status = $2")
        .bind(order_id)
        .bind(from)
        .bind(to)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Record the points earned once a payment succeeds.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn set_points_earned(
    executor: impl PgExecutor<'_>,
    order_id: OrderId,
    points: Decimal,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE orders SET loyalty_points_earned = $2 WHERE id = $1")
        .bind(order_id)
        .bind(points)
        .execute(executor)
        .await?;

    Ok(())
}
