//! Order, order item, payment, and delivery proof models.
//!
//! Orders are immutable after creation except `status` and
//! `loyalty_points_earned`. Order items snapshot the product name and price
//! at order time so later catalog edits never alter history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value as JsonValue;

use winniecho_core::{
    AddressId, DeliveryProofId, OrderId, OrderItemId, OrderNumber, OrderStatus, PaymentId,
    PaymentMethod, PaymentStatus, ProductId, UserId,
};

/// A customer order.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    /// Human-facing unique identifier, distinct from `id`.
    pub order_number: OrderNumber,
    pub address_id: AddressId,
    /// Pre-discount total, frozen at checkout.
    pub subtotal: Decimal,
    pub status: OrderStatus,
    pub loyalty_points_used: Decimal,
    pub loyalty_points_earned: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A line of an order, snapshotted at order creation.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub subtotal: Decimal,
}

/// A payment attempt against an order. Retries create new rows; at most one
/// row per order ever reaches `Success` (guarded by a conditional update).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Amount actually charged (post-discount).
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    /// External transaction id reported by the gateway.
    pub transaction_id: Option<String>,
    /// Gateway checkout/approval session id.
    pub gateway_session_id: Option<String>,
    /// Opaque gateway metadata blob.
    pub details: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}

/// Proof-of-delivery record, one per order, replaced in place on re-upload.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DeliveryProof {
    pub id: DeliveryProofId,
    pub order_id: OrderId,
    pub driver_id: UserId,
    pub image_path: String,
    pub uploaded_at: DateTime<Utc>,
}
