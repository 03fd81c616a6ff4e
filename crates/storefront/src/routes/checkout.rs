//! Checkout route handler.

use axum::{Json, extract::State, http::StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use winniecho_core::AddressId;

use crate::db::orders::OrderRepository;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::auth::RequireAuth;
use crate::models::order::Order;
use crate::services::checkout::{self, CheckoutRequest};
use crate::services::notifications::NewOrderNotification;
use crate::state::AppState;

/// Checkout request body.
#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub address_id: AddressId,
    /// Loyalty points to redeem. Omit for none.
    #[serde(default)]
    pub redeem_points: Decimal,
}

/// The placed order with its money breakdown. The client shows these
/// amounts on the payment-method screen.
#[derive(Debug, Serialize)]
pub struct PlaceOrderResponse {
    pub order: Order,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

/// POST /checkout
pub async fn place(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<PlaceOrderResponse>)> {
    add_breadcrumb("checkout", "order placement started", None);

    let placed = checkout::place_order(
        state.pool(),
        user.id,
        &CheckoutRequest {
            address_id: request.address_id,
            redeem_points: request.redeem_points,
        },
    )
    .await?;

    // Best-effort operator alert; a failed lookup never fails the checkout.
    if let Ok(Some(owner)) = OrderRepository::new(state.pool()).owner(placed.order.id).await {
        state.notifier().notify_admin_new_order(NewOrderNotification {
            customer_name: owner.name,
            customer_email: owner.email,
            order_number: placed.order.order_number.to_string(),
            subtotal: placed.totals.subtotal,
            total: placed.totals.total,
        });
    }

    Ok((
        StatusCode::CREATED,
        Json(PlaceOrderResponse {
            subtotal: placed.totals.subtotal,
            discount: placed.totals.discount,
            total: placed.totals.total,
            order: placed.order,
        }),
    ))
}
