//! Delivery proof repository.
//!
//! One proof row per order, enforced by a unique constraint; re-uploads
//! replace the stored image path rather than accumulating rows.

use sqlx::{PgExecutor, PgPool};

use winniecho_core::{OrderId, UserId};

use super::RepositoryError;
use crate::models::order::DeliveryProof;

/// Repository for delivery proof database operations.
pub struct DeliveryProofRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DeliveryProofRepository<'a> {
    /// Create a new delivery proof repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the proof for an order, if one was uploaded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<DeliveryProof>, RepositoryError> {
        let proof = sqlx::query_as::<_, DeliveryProof>(
            "SELECT id, order_id, driver_id, image_path, uploaded_at
             FROM delivery_proofs WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(proof)
    }
}

/// Attach a proof image to an order, replacing any earlier upload.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the upsert fails.
pub async fn upsert(
    executor: impl PgExecutor<'_>,
    order_id: OrderId,
    driver_id: UserId,
    image_path: &str,
) -> Result<DeliveryProof, RepositoryError> {
    let proof = sqlx::query_as::<_, DeliveryProof>(
        "INSERT INTO delivery_proofs (order_id, driver_id, image_path)
         VALUES ($1, $2, $3)
         ON CONFLICT (order_id)
         DO UPDATE SET driver_id = EXCLUDED.driver_id,
                       image_path = EXCLUDED.image_path,
                       uploaded_at = NOW()
         RETURNING id, order_id, driver_id, image_path, uploaded_at",
    )
    .bind(order_id)
    .bind(driver_id)
    .bind(image_path)
    .fetch_one(executor)
    .await?;

    Ok(proof)
}
