//! Order fulfillment: the staff-side status machine and proof of delivery.
//!
//! Status moves one legal step at a time (see `OrderStatus`), each step a
//! conditional UPDATE, so two staff clicking at once cannot double-advance
//! an order. Proof images land on local disk under the configured media
//! directory; the database row stores only the relative path.

use std::path::Path;

use thiserror::Error;

use winniecho_core::{OrderId, OrderStatus, UserId};

use crate::db::orders::OrderRepository;
use crate::db::{RepositoryError, delivery_proofs, orders};
use crate::models::order::{DeliveryProof, Order};
use crate::services::notifications::StatusNotification;
use crate::services::payment;
use crate::state::AppState;

/// Errors from fulfillment operations.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// Order does not exist.
    #[error("order not found")]
    OrderNotFound,

    /// The requested step is not a legal transition.
    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Proof upload against an order that has not shipped.
    #[error("order has not shipped yet")]
    NotYetShipped,

    /// A concurrent update moved the order first.
    #[error("order status changed concurrently")]
    Superseded,

    /// Proof image could not be stored.
    #[error("failed to store proof image: {0}")]
    Storage(#[from] std::io::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Advance an order one step through the fulfillment machine.
///
/// # Errors
///
/// Returns `InvalidTransition` for illegal steps and `Superseded` when a
/// concurrent update won the conditional write.
pub async fn advance(
    state: &AppState,
    order_id: OrderId,
    to: OrderStatus,
) -> Result<Order, FulfillmentError> {
    let repo = OrderRepository::new(state.pool());
    let order = repo.get(order_id).await?.ok_or(FulfillmentError::OrderNotFound)?;

    let from = order.status;
    if !from.can_transition_to(to) {
        return Err(FulfillmentError::InvalidTransition { from, to });
    }

    let transitioned = orders::transition_status(state.pool(), order_id, from, to).await?;
    if !transitioned {
        return Err(FulfillmentError::Superseded);
    }

    tracing::info!(order_number = %order.order_number, %from, %to, "order status advanced");

    if to == OrderStatus::Delivered {
        payment::settle_cod_on_delivery(state, order_id)
            .await
            .map_err(|error| {
                tracing::error!(%error, %order_id, "cash settlement on delivery failed");
                FulfillmentError::Repository(RepositoryError::Conflict(error.to_string()))
            })?;
    }

    notify_customer(state, &order, to).await;

    repo.get(order_id)
        .await?
        .ok_or(FulfillmentError::OrderNotFound)
}

/// Attach a proof-of-delivery image to a shipped order and mark it
/// delivered. Re-uploading replaces the stored image; the order stays
/// delivered.
///
/// # Errors
///
/// Returns `NotYetShipped` for orders before the Shipped state and
/// `Storage` when the image cannot be written.
pub async fn attach_proof(
    state: &AppState,
    order_id: OrderId,
    driver_id: UserId,
    image_bytes: &[u8],
    extension: &str,
) -> Result<DeliveryProof, FulfillmentError> {
    let repo = OrderRepository::new(state.pool());
    let order = repo.get(order_id).await?.ok_or(FulfillmentError::OrderNotFound)?;

    if !matches!(order.status, OrderStatus::Shipped | OrderStatus::Delivered) {
        return Err(FulfillmentError::NotYetShipped);
    }

    let relative_path = store_image(&state.config().media_dir, order_id, image_bytes, extension)
        .await?;

    let proof = delivery_proofs::upsert(state.pool(), order_id, driver_id, &relative_path).await?;

    if order.status == OrderStatus::Shipped {
        // Losing this write means another upload delivered the order
        // between our read and now; the proof row is already in place.
        let delivered = orders::transition_status(
            state.pool(),
            order_id,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        )
        .await?;

        if delivered {
            tracing::info!(order_number = %order.order_number, "order delivered with proof");
            payment::settle_cod_on_delivery(state, order_id)
                .await
                .map_err(|error| {
                    tracing::error!(%error, %order_id, "cash settlement on delivery failed");
                    FulfillmentError::Repository(RepositoryError::Conflict(error.to_string()))
                })?;

            // Gated on the won transition: a proof re-upload finds the
            // order already delivered and stays silent.
            notify_customer(state, &order, OrderStatus::Delivered).await;
        }
    }

    Ok(proof)
}

/// Send the customer the reached state's message, best-effort. Called only
/// after a won conditional transition so each step announces once.
async fn notify_customer(state: &AppState, order: &Order, status: OrderStatus) {
    match OrderRepository::new(state.pool()).owner(order.id).await {
        Ok(Some(owner)) => {
            state.notifier().notify_status_changed(StatusNotification {
                customer_name: owner.name,
                customer_email: owner.email,
                order_number: order.order_number.to_string(),
                status,
            });
        }
        Ok(None) => {}
        Err(error) => {
            tracing::warn!(%error, order_id = %order.id, "owner lookup for status email failed");
        }
    }
}

/// Write the image under `<media_dir>/proofs/` and return the relative
/// path stored in the database.
async fn store_image(
    media_dir: &str,
    order_id: OrderId,
    image_bytes: &[u8],
    extension: &str,
) -> Result<String, std::io::Error> {
    let timestamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
    let relative = format!("proofs/order-{order_id}-{timestamp}.{extension}");

    let full = Path::new(media_dir).join(&relative);
    if let Some(parent) = full.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&full, image_bytes).await?;

    Ok(relative)
}
