//! Order history route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use winniecho_core::OrderId;

use crate::db::delivery_proofs::DeliveryProofRepository;
use crate::db::orders::OrderRepository;
use crate::db::payments::PaymentRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireAuth;
use crate::models::order::{DeliveryProof, Order, OrderItem, Payment};
use crate::state::AppState;

/// A full order view: snapshot lines, the latest payment attempt, and the
/// delivery proof once one exists.
#[derive(Debug, Serialize)]
pub struct OrderDetailResponse {
    pub order: Order,
    /// Customer-facing wording for the current status.
    pub status_message: &'static str,
    pub items: Vec<OrderItem>,
    pub payment: Option<Payment>,
    pub delivery_proof: Option<DeliveryProof>,
}

/// GET /orders
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;

    Ok(Json(orders))
}

/// GET /orders/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetailResponse>> {
    let repo = OrderRepository::new(state.pool());
    let order = repo
        .get_for_user(id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    let items = repo.items(order.id).await?;
    let payment = PaymentRepository::new(state.pool())
        .latest_for_order(order.id)
        .await?;
    let delivery_proof = DeliveryProofRepository::new(state.pool())
        .get_for_order(order.id)
        .await?;

    Ok(Json(OrderDetailResponse {
        status_message: order.status.customer_message(),
        order,
        items,
        payment,
        delivery_proof,
    }))
}
