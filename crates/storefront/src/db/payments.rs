//! Payment repository.
//!
//! The success claim is the idempotency anchor for the whole payment flow:
//! return URL and webhook both race toward it, and `claim_success` lets
//! exactly one of them through by carrying `status <> 'success'` in the
//! predicate. Whoever wins runs finalization; the loser sees `None`.

use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::{PgExecutor, PgPool};

use winniecho_core::{OrderId, PaymentId, PaymentMethod, PaymentStatus};

use super::RepositoryError;
use crate::models::order::Payment;

const SELECT: &str = "SELECT id, order_id, method, status, total_amount, discount_amount,
                      transaction_id, gateway_session_id, details, created_at FROM payments";

/// Repository for payment database operations.
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    /// Create a new payment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a payment by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: PaymentId) -> Result<Option<Payment>, RepositoryError> {
        let payment = sqlx::query_as::<_, Payment>(&format!("{SELECT} WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(payment)
    }

    /// Get the most recent payment attempt for an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Payment>, RepositoryError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "{SELECT} WHERE order_id = $1 ORDER BY created_at DESC, id DESC LIMIT 1"
        ))
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(payment)
    }

    /// Find a payment by the gateway session that created it. Used by the
    /// webhook path, which only knows the gateway's identifier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_gateway_session(
        &self,
        session_id: &str,
    ) -> Result<Option<Payment>, RepositoryError> {
        let payment =
            sqlx::query_as::<_, Payment>(&format!("{SELECT} WHERE gateway_session_id = $1"))
                .bind(session_id)
                .fetch_optional(self.pool)
                .await?;

        Ok(payment)
    }
}

/// Insert a new payment attempt.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn create(
    executor: impl PgExecutor<'_>,
    order_id: OrderId,
    method: PaymentMethod,
    status: PaymentStatus,
    total_amount: Decimal,
    discount_amount: Decimal,
) -> Result<Payment, RepositoryError> {
    let payment = sqlx::query_as::<_, Payment>(
        "INSERT INTO payments (order_id, method, status, total_amount, discount_amount, details)
         VALUES ($1, $2, $3, $4, $5, '{}'::jsonb)
         RETURNING id, order_id, method, status, total_amount, discount_amount,
                   transaction_id, gateway_session_id, details, created_at",
    )
    .bind(order_id)
    .bind(method)
    .bind(status)
    .bind(total_amount)
    .bind(discount_amount)
    .fetch_one(executor)
    .await?;

    Ok(payment)
}

/// Attach the gateway's session identifier after session creation.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn set_gateway_session(
    executor: impl PgExecutor<'_>,
    id: PaymentId,
    session_id: &str,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE payments SET gateway_session_id = $2 WHERE id = $1")
        .bind(id)
        .bind(session_id)
        .execute(executor)
        .await?;

    Ok(())
}

/// Claim the payment's transition to success. Exactly one caller wins: the
/// predicate excludes rows already successful, so a webhook and a return
/// redirect arriving together produce a single finalization. Returns the
/// updated payment for the winner, `None` for everyone else.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn claim_success(
    executor: impl PgExecutor<'_>,
    id: PaymentId,
    transaction_id: &str,
    details: &JsonValue,
) -> Result<Option<Payment>, RepositoryError> {
    let payment = sqlx::query_as::<_, Payment>(
        "UPDATE payments
         SET status = $2, transaction_id = $3, details = $4
         WHERE id = $1 AND status <> $2
         RETURNING id, order_id, method, status, total_amount, discount_amount,
                   transaction_id, gateway_session_id, details, created_at",
    )
    .bind(id)
    .bind(PaymentStatus::Success)
    .bind(transaction_id)
    .bind(details)
    .fetch_optional(executor)
    .await?;

    Ok(payment)
}

/// Mark an open payment as failed. Success is sticky: an already-successful
/// payment is never downgraded.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn mark_failed(
    executor: impl PgExecutor<'_>,
    id: PaymentId,
    details: &JsonValue,
) -> Result<bool, RepositoryError> {
    close(executor, id, PaymentStatus::Failed, details).await
}

/// Mark an open payment as cancelled by the customer.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn mark_cancelled(
    executor: impl PgExecutor<'_>,
    id: PaymentId,
    details: &JsonValue,
) -> Result<bool, RepositoryError> {
    close(executor, id, PaymentStatus::Cancelled, details).await
}

async fn close(
    executor: impl PgExecutor<'_>,
    id: PaymentId,
    status: PaymentStatus,
    details: &JsonValue,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        "UPDATE payments SET status = $2, details = $3 WHERE id = $1 AND status <> $4",
    )
    .bind(id)
    .bind(status)
    .bind(details)
    .bind(PaymentStatus::Success)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}
